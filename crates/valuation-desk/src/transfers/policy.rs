use super::domain::{TransferStatus, ValuationTransfer};
use super::service::TransferError;
use crate::identity::{Caller, User};
use crate::valuations::Valuation;

/// Draft plus in-progress valuations a preparer may hold before refusing new transfers.
pub const MAX_ACTIVE_WORKLOAD: usize = 10;

pub fn ensure_can_transfer(caller: &Caller, valuation: &Valuation) -> Result<(), TransferError> {
    if !valuation.is_owned_by(caller.id) {
        return Err(TransferError::Forbidden("you cannot transfer this valuation"));
    }
    if valuation.status.is_locked() {
        return Err(TransferError::Forbidden(
            "cannot transfer a completed or approved valuation",
        ));
    }
    Ok(())
}

pub fn ensure_can_receive(target: &User, workload: usize) -> Result<(), TransferError> {
    if !target.is_active {
        return Err(TransferError::Forbidden("the receiving user is inactive"));
    }
    if workload >= MAX_ACTIVE_WORKLOAD {
        return Err(TransferError::Forbidden(
            "the receiving user's workload is full",
        ));
    }
    Ok(())
}

pub fn ensure_pending(transfer: &ValuationTransfer) -> Result<(), TransferError> {
    if transfer.status == TransferStatus::Pending {
        Ok(())
    } else {
        Err(TransferError::Conflict("this transfer has already been handled"))
    }
}

/// Any authenticated caller may approve or reject a pending transfer.
// TODO: restrict to the receiving user or a manager once the approval rule is agreed.
pub fn can_approve(_caller: &Caller, _transfer: &ValuationTransfer) -> bool {
    true
}
