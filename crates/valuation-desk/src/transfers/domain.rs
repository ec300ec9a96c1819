use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::valuations::ValuationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub u64);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `pending` is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl TransferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    Temporary,
    #[default]
    Permanent,
}

impl TransferType {
    pub const fn label(self) -> &'static str {
        match self {
            TransferType::Temporary => "temporary",
            TransferType::Permanent => "permanent",
        }
    }
}

/// One reassignment request. Rows are never deleted and double as the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationTransfer {
    pub id: TransferId,
    pub valuation_id: ValuationId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub reason: String,
    pub priority: TransferPriority,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub transfer_type: TransferType,
    pub status: TransferStatus,
    pub requires_approval: bool,
    pub approved_by: Option<UserId>,
    pub approval_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl ValuationTransfer {
    pub fn involves(&self, user: UserId) -> bool {
        self.from_user_id == user || self.to_user_id == user
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub to_user_id: Option<UserId>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub priority: TransferPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transfer_type: TransferType,
    #[serde(default = "approval_required_by_default")]
    pub requires_approval: bool,
}

fn approval_required_by_default() -> bool {
    true
}

impl TransferRequest {
    pub fn to(user: UserId, reason: impl Into<String>) -> Self {
        Self {
            to_user_id: Some(user),
            reason: reason.into(),
            priority: TransferPriority::default(),
            due_date: None,
            notes: None,
            transfer_type: TransferType::default(),
            requires_approval: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub approval_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectionRequest {
    #[serde(default)]
    pub rejection_reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectionStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthStats {
    pub sent: usize,
    pub received: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferStats {
    pub sent_transfers: DirectionStats,
    pub received_transfers: DirectionStats,
    pub this_month: MonthStats,
}
