use super::domain::{Valuation, ValuationId, ValuationStatus};
use crate::identity::UserId;
use crate::store::RepositoryError;

/// Storage abstraction for valuation records.
pub trait ValuationRepository: Send + Sync {
    /// Assigns the identifier; the valuation number must be unique.
    fn insert_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError>;
    fn update_valuation(&self, valuation: Valuation) -> Result<Valuation, RepositoryError>;
    fn valuation(&self, id: ValuationId) -> Result<Option<Valuation>, RepositoryError>;
    /// Newest first.
    fn valuations(&self, filter: &ValuationFilter) -> Result<Vec<Valuation>, RepositoryError>;

    fn count_valuations(&self, filter: &ValuationFilter) -> Result<usize, RepositoryError> {
        Ok(self.valuations(filter)?.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuationFilter {
    /// Empty matches every status.
    pub statuses: Vec<ValuationStatus>,
    pub prepared_by: Option<UserId>,
    pub active: Option<bool>,
    pub located_only: bool,
}

impl ValuationFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }

    /// Draft and in-progress work held by `user` as preparer.
    pub fn workload_of(user: UserId) -> Self {
        Self {
            statuses: vec![ValuationStatus::Draft, ValuationStatus::InProgress],
            prepared_by: Some(user),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ValuationStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    pub fn matches(&self, valuation: &Valuation) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&valuation.status))
            && self
                .prepared_by
                .map_or(true, |user| valuation.prepared_by == user)
            && self.active.map_or(true, |active| valuation.is_active == active)
            && (!self.located_only || valuation.location.is_some())
    }
}
