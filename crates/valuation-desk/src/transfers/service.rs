use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use super::domain::{
    ApprovalRequest, DirectionStats, RejectionRequest, TransferId, TransferRequest,
    TransferStats, TransferStatus, TransferType, ValuationTransfer,
};
use super::notify::{NoticeKind, TransferNotice, TransferNotifier};
use super::policy::{can_approve, ensure_can_receive, ensure_can_transfer, ensure_pending};
use super::repository::{
    Reassignment, TransferFilter, TransferRepository, TransferUnitOfWork, TransferWrite,
};
use crate::api::ApiError;
use crate::identity::{Caller, IdentityRepository, User, UserId};
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;
use crate::valuations::{ValuationFilter, ValuationId, ValuationRepository};

/// Filters accepted by the history listing.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub status: Option<TransferStatus>,
    pub transfer_type: Option<TransferType>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Transfer state machine: `pending -> approved | rejected | cancelled`.
pub struct TransferService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> TransferService<S, N>
where
    S: TransferRepository + ValuationRepository + IdentityRepository + 'static,
    N: TransferNotifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Opens a transfer on `valuation_id`. Checks run in a fixed order and the first failure
    /// aborts before anything is written.
    pub fn request(
        &self,
        caller: &Caller,
        valuation_id: ValuationId,
        request: TransferRequest,
    ) -> Result<ValuationTransfer, TransferError> {
        let valuation = self
            .store
            .valuation(valuation_id)?
            .ok_or(RepositoryError::NotFound("valuation"))?;

        let now = Utc::now();
        let target = self.validate_request(caller, &request, now.date_naive())?;

        ensure_can_transfer(caller, &valuation)?;

        let pending = TransferFilter {
            valuation_id: Some(valuation_id),
            status: Some(TransferStatus::Pending),
            ..TransferFilter::default()
        };
        if !self.store.transfers(&pending)?.is_empty() {
            return Err(TransferError::Conflict(
                "a pending transfer already exists for this valuation",
            ));
        }

        let workload = self
            .store
            .count_valuations(&ValuationFilter::workload_of(target.id))?;
        ensure_can_receive(&target, workload)?;

        let status = if request.requires_approval {
            TransferStatus::Pending
        } else {
            TransferStatus::Approved
        };
        let processed = status == TransferStatus::Approved;
        let record = ValuationTransfer {
            id: TransferId(0),
            valuation_id,
            from_user_id: caller.id,
            to_user_id: target.id,
            reason: request.reason.trim().to_string(),
            priority: request.priority,
            due_date: request.due_date,
            notes: request.notes,
            transfer_type: request.transfer_type,
            status,
            requires_approval: request.requires_approval,
            approved_by: None,
            approval_notes: None,
            rejection_reason: None,
            requested_at: now,
            approved_at: processed.then_some(now),
            cancelled_at: None,
            processed_at: processed.then_some(now),
        };
        let reassignment = processed.then(|| Reassignment {
            valuation_id,
            to_user: target.id,
            transferred_at: now,
            notes: record.notes.clone(),
        });

        let stored = self.store.commit_transfer(TransferUnitOfWork {
            transfer: TransferWrite::Insert(record),
            reassignment,
        })?;
        info!(
            transfer = %stored.id,
            valuation = %valuation_id,
            from = %stored.from_user_id,
            to = %stored.to_user_id,
            status = stored.status.label(),
            "transfer requested"
        );

        let kind = if processed {
            NoticeKind::Approved
        } else {
            NoticeKind::Requested
        };
        self.publish(kind, &stored, stored.to_user_id);
        Ok(stored)
    }

    fn validate_request(
        &self,
        caller: &Caller,
        request: &TransferRequest,
        today: NaiveDate,
    ) -> Result<User, TransferError> {
        let mut errors = ValidationErrors::new();
        errors.length("reason", &request.reason, 10, 500);
        errors.max_length("notes", request.notes.as_deref(), 1000);
        if let Some(due_date) = request.due_date {
            if due_date <= today {
                errors.add("due_date", "the due_date must be a date after today");
            }
        }

        let target = match request.to_user_id {
            None => {
                errors.add("to_user_id", "the to_user_id field is required");
                None
            }
            Some(user) if user == caller.id => {
                errors.add(
                    "to_user_id",
                    "the to_user_id must be different from the requester",
                );
                None
            }
            Some(user) => {
                let found = self.store.user(user)?;
                if found.is_none() {
                    errors.add("to_user_id", format!("user {user} does not exist"));
                }
                found
            }
        };

        errors.into_result()?;
        target.ok_or_else(|| {
            TransferError::Validation(ValidationErrors::single(
                "to_user_id",
                "the to_user_id field is required",
            ))
        })
    }

    /// Approves a pending transfer and hands the valuation to the receiving user in the same
    /// unit of work.
    pub fn approve(
        &self,
        caller: &Caller,
        transfer_id: TransferId,
        request: ApprovalRequest,
    ) -> Result<ValuationTransfer, TransferError> {
        let transfer = self.fetch(transfer_id)?;

        let mut errors = ValidationErrors::new();
        errors.max_length("approval_notes", request.approval_notes.as_deref(), 500);
        errors.into_result()?;

        if !can_approve(caller, &transfer) {
            return Err(TransferError::Forbidden("you cannot approve this transfer"));
        }
        ensure_pending(&transfer)?;

        let now = Utc::now();
        let reassignment = Reassignment {
            valuation_id: transfer.valuation_id,
            to_user: transfer.to_user_id,
            transferred_at: now,
            notes: transfer.notes.clone(),
        };
        let updated = ValuationTransfer {
            status: TransferStatus::Approved,
            approved_by: Some(caller.id),
            approved_at: Some(now),
            approval_notes: request.approval_notes,
            processed_at: Some(now),
            ..transfer
        };

        let stored = self.store.commit_transfer(TransferUnitOfWork {
            transfer: TransferWrite::Update(updated),
            reassignment: Some(reassignment),
        })?;
        info!(
            transfer = %stored.id,
            valuation = %stored.valuation_id,
            approver = %caller.id,
            "transfer approved"
        );
        self.publish(NoticeKind::Approved, &stored, stored.from_user_id);
        Ok(stored)
    }

    pub fn reject(
        &self,
        caller: &Caller,
        transfer_id: TransferId,
        request: RejectionRequest,
    ) -> Result<ValuationTransfer, TransferError> {
        let transfer = self.fetch(transfer_id)?;

        let mut errors = ValidationErrors::new();
        errors.length("rejection_reason", &request.rejection_reason, 10, 500);
        errors.into_result()?;

        if !can_approve(caller, &transfer) {
            return Err(TransferError::Forbidden("you cannot reject this transfer"));
        }
        ensure_pending(&transfer)?;

        let updated = ValuationTransfer {
            status: TransferStatus::Rejected,
            approved_by: Some(caller.id),
            approved_at: Some(Utc::now()),
            rejection_reason: Some(request.rejection_reason.trim().to_string()),
            ..transfer
        };
        let stored = self.store.commit_transfer(TransferUnitOfWork {
            transfer: TransferWrite::Update(updated),
            reassignment: None,
        })?;
        info!(transfer = %stored.id, responder = %caller.id, "transfer rejected");
        self.publish(NoticeKind::Rejected, &stored, stored.from_user_id);
        Ok(stored)
    }

    /// Only the requester may withdraw a pending transfer.
    pub fn cancel(
        &self,
        caller: &Caller,
        transfer_id: TransferId,
    ) -> Result<ValuationTransfer, TransferError> {
        let transfer = self.fetch(transfer_id)?;
        if transfer.from_user_id != caller.id {
            return Err(TransferError::Forbidden("you cannot cancel this transfer"));
        }
        ensure_pending(&transfer)?;

        let updated = ValuationTransfer {
            status: TransferStatus::Cancelled,
            cancelled_at: Some(Utc::now()),
            ..transfer
        };
        let stored = self.store.commit_transfer(TransferUnitOfWork {
            transfer: TransferWrite::Update(updated),
            reassignment: None,
        })?;
        info!(transfer = %stored.id, "transfer cancelled");
        self.publish(NoticeKind::Cancelled, &stored, stored.to_user_id);
        Ok(stored)
    }

    pub fn get(&self, transfer_id: TransferId) -> Result<ValuationTransfer, TransferError> {
        self.fetch(transfer_id)
    }

    /// Pending transfers addressed to the caller.
    pub fn pending_for(&self, caller: &Caller) -> Result<Vec<ValuationTransfer>, TransferError> {
        let filter = TransferFilter {
            to_user: Some(caller.id),
            status: Some(TransferStatus::Pending),
            ..TransferFilter::default()
        };
        Ok(self.store.transfers(&filter)?)
    }

    /// Transfers the caller sent or received, newest first.
    pub fn history(
        &self,
        caller: &Caller,
        query: HistoryQuery,
        page: PageRequest,
    ) -> Result<Page<ValuationTransfer>, TransferError> {
        if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
            if to < from {
                return Err(ValidationErrors::single(
                    "date_to",
                    "the date_to must be a date after or equal to date_from",
                )
                .into());
            }
        }
        let filter = TransferFilter {
            participant: Some(caller.id),
            status: query.status,
            transfer_type: query.transfer_type,
            requested_from: query.date_from,
            requested_to: query.date_to,
            ..TransferFilter::default()
        };
        Ok(Page::paginate(self.store.transfers(&filter)?, page))
    }

    pub fn for_valuation(
        &self,
        valuation_id: ValuationId,
    ) -> Result<Vec<ValuationTransfer>, TransferError> {
        if self.store.valuation(valuation_id)?.is_none() {
            return Err(RepositoryError::NotFound("valuation").into());
        }
        let filter = TransferFilter {
            valuation_id: Some(valuation_id),
            ..TransferFilter::default()
        };
        Ok(self.store.transfers(&filter)?)
    }

    pub fn stats(&self, caller: &Caller) -> Result<TransferStats, TransferError> {
        self.stats_at(caller, Utc::now().date_naive())
    }

    pub fn stats_at(
        &self,
        caller: &Caller,
        today: NaiveDate,
    ) -> Result<TransferStats, TransferError> {
        let filter = TransferFilter {
            participant: Some(caller.id),
            ..TransferFilter::default()
        };
        let mut stats = TransferStats::default();
        for transfer in self.store.transfers(&filter)? {
            let requested = transfer.requested_at.date_naive();
            let this_month = requested.year() == today.year() && requested.month() == today.month();
            if transfer.from_user_id == caller.id {
                tally(&mut stats.sent_transfers, transfer.status);
                if this_month {
                    stats.this_month.sent += 1;
                }
            }
            if transfer.to_user_id == caller.id {
                tally(&mut stats.received_transfers, transfer.status);
                if this_month {
                    stats.this_month.received += 1;
                }
            }
        }
        Ok(stats)
    }

    fn fetch(&self, transfer_id: TransferId) -> Result<ValuationTransfer, TransferError> {
        Ok(self
            .store
            .transfer(transfer_id)?
            .ok_or(RepositoryError::NotFound("transfer"))?)
    }

    /// Failures are logged and never undo the committed transfer.
    fn publish(&self, kind: NoticeKind, transfer: &ValuationTransfer, recipient: UserId) {
        let notice = TransferNotice {
            kind,
            transfer_id: transfer.id,
            valuation_id: transfer.valuation_id,
            recipient,
        };
        if let Err(err) = self.notifier.notify(notice) {
            warn!(transfer = %transfer.id, error = %err, "transfer notification failed");
        }
    }
}

fn tally(stats: &mut DirectionStats, status: TransferStatus) {
    stats.total += 1;
    match status {
        TransferStatus::Pending => stats.pending += 1,
        TransferStatus::Approved => stats.approved += 1,
        TransferStatus::Rejected => stats.rejected += 1,
        TransferStatus::Cancelled => {}
    }
}

/// Error raised by the transfer service.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<TransferError> for ApiError {
    fn from(value: TransferError) -> Self {
        match value {
            TransferError::Validation(errors) => ApiError::validation(errors),
            TransferError::Forbidden(reason) => ApiError::forbidden(reason),
            TransferError::Conflict(reason) => ApiError::conflict(reason),
            TransferError::Repository(err) => err.into(),
        }
    }
}
