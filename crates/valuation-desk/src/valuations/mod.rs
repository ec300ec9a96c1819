//! Valuation records: one appraisal job each, owned by a preparer/inspector pair.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    NewValuation, PropertyDetails, ReportDetails, Valuation, ValuationId, ValuationResults,
    ValuationStatus, ValuationUpdate,
};
pub use repository::{ValuationFilter, ValuationRepository};
pub use router::valuation_router;
pub use service::{next_valuation_number, ValuationError, ValuationService};
