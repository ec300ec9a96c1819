use crate::cli::ServeArgs;
use crate::demo::seed_demo;
use crate::infra::{AppState, Services};
use crate::routes::{api_routes, with_operational_routes};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use valuation_desk::config::AppConfig;
use valuation_desk::error::AppError;
use valuation_desk::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.no_demo {
        config.seed_demo_data = false;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory();
    let mut tokens = config.auth.tokens.clone();
    if config.seed_demo_data {
        let dataset = seed_demo(&services)?;
        if tokens.is_empty() {
            tokens = dataset.tokens();
            warn!(
                tokens = tokens.len(),
                "no APP_API_TOKENS configured, accepting demo tokens"
            );
        }
    } else {
        let seeded = services.identity.seed_defaults()?;
        info!(
            permissions = seeded.permissions,
            roles = seeded.roles,
            "default roles seeded"
        );
    }

    let app = with_operational_routes(api_routes(&services, tokens), app_state)
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "valuation desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}
