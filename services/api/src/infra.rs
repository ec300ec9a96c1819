use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use valuation_desk::identity::IdentityService;
use valuation_desk::reports::{HtmlPreviewRenderer, ReportService};
use valuation_desk::sketches::SketchService;
use valuation_desk::statistics::StatisticsService;
use valuation_desk::store::MemoryStore;
use valuation_desk::transfers::{LogNotifier, TransferService};
use valuation_desk::valuations::ValuationService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every component service, sharing one in-memory store.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) identity: Arc<IdentityService<MemoryStore>>,
    pub(crate) valuations: Arc<ValuationService<MemoryStore>>,
    pub(crate) transfers: Arc<TransferService<MemoryStore, LogNotifier>>,
    pub(crate) sketches: Arc<SketchService<MemoryStore>>,
    pub(crate) reports: Arc<ReportService<MemoryStore, HtmlPreviewRenderer>>,
    pub(crate) statistics: Arc<StatisticsService<MemoryStore>>,
}

impl Services {
    pub(crate) fn in_memory() -> Self {
        Self::over(Arc::new(MemoryStore::new()))
    }

    pub(crate) fn over(store: Arc<MemoryStore>) -> Self {
        Self {
            identity: Arc::new(IdentityService::new(store.clone())),
            valuations: Arc::new(ValuationService::new(store.clone())),
            transfers: Arc::new(TransferService::new(store.clone(), Arc::new(LogNotifier))),
            sketches: Arc::new(SketchService::new(store.clone())),
            reports: Arc::new(ReportService::new(
                store.clone(),
                Arc::new(HtmlPreviewRenderer),
            )),
            statistics: Arc::new(StatisticsService::new(store.clone())),
            store,
        }
    }
}
