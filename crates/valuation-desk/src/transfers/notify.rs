use serde::Serialize;
use tracing::info;

use super::domain::TransferId;
use crate::identity::UserId;
use crate::valuations::ValuationId;

/// Outbound hook for transfer events (mail transport, push, ...).
pub trait TransferNotifier: Send + Sync {
    fn notify(&self, notice: TransferNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Requested,
    Approved,
    Rejected,
    Cancelled,
}

impl NoticeKind {
    pub const fn label(self) -> &'static str {
        match self {
            NoticeKind::Requested => "transfer_requested",
            NoticeKind::Approved => "transfer_approved",
            NoticeKind::Rejected => "transfer_rejected",
            NoticeKind::Cancelled => "transfer_cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferNotice {
    pub kind: NoticeKind,
    pub transfer_id: TransferId,
    pub valuation_id: ValuationId,
    pub recipient: UserId,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Writes notices to the structured log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl TransferNotifier for LogNotifier {
    fn notify(&self, notice: TransferNotice) -> Result<(), NotifyError> {
        info!(
            template = notice.kind.label(),
            transfer = %notice.transfer_id,
            valuation = %notice.valuation_id,
            recipient = %notice.recipient,
            "transfer notice"
        );
        Ok(())
    }
}
