//! Reassignment of a valuation's preparer between staff members.
//!
//! A request opens a `pending` transfer (or an immediately `approved` one when approval is
//! waived). Approval writes the transfer and the valuation's new preparer as one unit of work.

pub mod domain;
pub mod notify;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApprovalRequest, DirectionStats, MonthStats, RejectionRequest, TransferId, TransferPriority,
    TransferRequest, TransferStats, TransferStatus, TransferType, ValuationTransfer,
};
pub use notify::{LogNotifier, NoticeKind, NotifyError, TransferNotice, TransferNotifier};
pub use policy::MAX_ACTIVE_WORKLOAD;
pub use repository::{
    Reassignment, TransferFilter, TransferRepository, TransferUnitOfWork, TransferWrite,
};
pub use router::transfer_router;
pub use service::{HistoryQuery, TransferError, TransferService};
