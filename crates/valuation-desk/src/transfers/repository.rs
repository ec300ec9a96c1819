use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{TransferId, TransferStatus, TransferType, ValuationTransfer};
use crate::identity::UserId;
use crate::store::RepositoryError;
use crate::valuations::ValuationId;

/// Storage abstraction for transfers.
pub trait TransferRepository: Send + Sync {
    fn transfer(&self, id: TransferId) -> Result<Option<ValuationTransfer>, RepositoryError>;
    /// Newest first.
    fn transfers(&self, filter: &TransferFilter)
        -> Result<Vec<ValuationTransfer>, RepositoryError>;

    /// Applies every write in `unit` or none of them.
    ///
    /// Implementations must reject with [`RepositoryError::Conflict`] when the unit would leave
    /// two pending transfers on one valuation, or when an update targets a transfer that is no
    /// longer pending.
    fn commit_transfer(
        &self,
        unit: TransferUnitOfWork,
    ) -> Result<ValuationTransfer, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferWrite {
    Insert(ValuationTransfer),
    Update(ValuationTransfer),
}

impl TransferWrite {
    pub fn record(&self) -> &ValuationTransfer {
        match self {
            TransferWrite::Insert(record) | TransferWrite::Update(record) => record,
        }
    }
}

/// The valuation side of an approved transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reassignment {
    pub valuation_id: ValuationId,
    pub to_user: UserId,
    pub transferred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferUnitOfWork {
    pub transfer: TransferWrite,
    pub reassignment: Option<Reassignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub valuation_id: Option<ValuationId>,
    pub from_user: Option<UserId>,
    pub to_user: Option<UserId>,
    /// Matches either side of the transfer.
    pub participant: Option<UserId>,
    pub status: Option<TransferStatus>,
    pub transfer_type: Option<TransferType>,
    pub requested_from: Option<NaiveDate>,
    pub requested_to: Option<NaiveDate>,
}

impl TransferFilter {
    pub fn matches(&self, transfer: &ValuationTransfer) -> bool {
        let requested_on = transfer.requested_at.date_naive();
        self.valuation_id
            .map_or(true, |id| transfer.valuation_id == id)
            && self.from_user.map_or(true, |user| transfer.from_user_id == user)
            && self.to_user.map_or(true, |user| transfer.to_user_id == user)
            && self.participant.map_or(true, |user| transfer.involves(user))
            && self.status.map_or(true, |status| transfer.status == status)
            && self
                .transfer_type
                .map_or(true, |kind| transfer.transfer_type == kind)
            && self.requested_from.map_or(true, |from| requested_on >= from)
            && self.requested_to.map_or(true, |to| requested_on <= to)
    }
}
