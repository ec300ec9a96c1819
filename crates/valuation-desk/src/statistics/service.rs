use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, Utc};
use tracing::debug;

use super::domain::{
    month_name, ActivityEntry, ActivityKind, DashboardStats, MonthlyCount, PropertyTypeCount,
    RoleUsers, StatusCount, TransferSummary, DASHBOARD_STATUSES, MONTHLY_WINDOW,
    RECENT_ACTIVITY_LIMIT, RECENT_ACTIVITY_PER_SOURCE, RECENT_TRANSFERS_LIMIT,
};
use super::export::{valuations_csv, ExportError};
use crate::api::{ApiError, ErrorCode};
use crate::identity::{IdentityRepository, User, UserId};
use crate::store::RepositoryError;
use crate::transfers::{TransferFilter, TransferRepository, TransferStatus};
use crate::valuations::{Valuation, ValuationFilter, ValuationRepository, ValuationStatus};

/// Read-only aggregation over valuations, transfers, and staff.
pub struct StatisticsService<S> {
    store: Arc<S>,
}

impl<S> StatisticsService<S>
where
    S: ValuationRepository + TransferRepository + IdentityRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn dashboard(&self) -> Result<DashboardStats, StatisticsError> {
        self.dashboard_at(Utc::now())
    }

    pub fn dashboard_at(&self, now: DateTime<Utc>) -> Result<DashboardStats, StatisticsError> {
        let valuations = self.store.valuations(&ValuationFilter::default())?;
        let count = |status: ValuationStatus| {
            valuations
                .iter()
                .filter(|valuation| valuation.status == status)
                .count()
        };
        let pending = TransferFilter {
            status: Some(TransferStatus::Pending),
            ..TransferFilter::default()
        };

        let stats = DashboardStats {
            total_valuations: valuations.len(),
            active_users: self
                .store
                .users()?
                .iter()
                .filter(|user| user.is_active)
                .count(),
            pending_valuations: count(ValuationStatus::Pending),
            pending_transfers: self.store.transfers(&pending)?.len(),
            completed_valuations: count(ValuationStatus::Completed),
            rejected_valuations: count(ValuationStatus::Rejected),
            monthly_valuations: monthly_counts(&valuations, now),
            property_types: property_type_counts(&valuations),
            users_by_role: self.users_by_role()?,
        };
        debug!(total = stats.total_valuations, "dashboard stats computed");
        Ok(stats)
    }

    /// Fixed order: draft, pending, in_progress, completed, rejected.
    pub fn by_status(&self) -> Result<Vec<StatusCount>, StatisticsError> {
        let valuations = self.store.valuations(&ValuationFilter::default())?;
        Ok(DASHBOARD_STATUSES
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: valuations
                    .iter()
                    .filter(|valuation| valuation.status == status)
                    .count(),
            })
            .collect())
    }

    /// Roles ordered by level with the number of users holding each.
    pub fn users_by_role(&self) -> Result<Vec<RoleUsers>, StatisticsError> {
        let users = self.store.users()?;
        Ok(self
            .store
            .roles()?
            .into_iter()
            .map(|role| RoleUsers {
                count: users
                    .iter()
                    .filter(|user| user.role_ids.contains(&role.id))
                    .count(),
                role: role.name_en,
                level: role.level,
            })
            .collect())
    }

    pub fn recent_transfers(&self) -> Result<Vec<TransferSummary>, StatisticsError> {
        let users = self.user_index()?;
        let transfers = self.store.transfers(&TransferFilter::default())?;
        let mut summaries = Vec::with_capacity(RECENT_TRANSFERS_LIMIT);
        for transfer in transfers.into_iter().take(RECENT_TRANSFERS_LIMIT) {
            let valuation_title = match self.store.valuation(transfer.valuation_id)? {
                Some(valuation) => valuation_title(&valuation),
                None => format!("valuation {}", transfer.valuation_id),
            };
            summaries.push(TransferSummary {
                id: transfer.id,
                valuation_title,
                from_user_name: user_name(&users, transfer.from_user_id),
                to_user_name: user_name(&users, transfer.to_user_id),
                status: transfer.status,
                reason: transfer.reason,
                requested_at: transfer.requested_at,
            });
        }
        Ok(summaries)
    }

    /// Five newest valuations and five newest transfers merged, newest first.
    pub fn recent_activity(&self) -> Result<Vec<ActivityEntry>, StatisticsError> {
        let users = self.user_index()?;
        let mut entries: Vec<ActivityEntry> = self
            .store
            .valuations(&ValuationFilter::default())?
            .into_iter()
            .take(RECENT_ACTIVITY_PER_SOURCE)
            .map(|valuation| ActivityEntry {
                kind: ActivityKind::ValuationCreated,
                description: format!("valuation {} created", valuation.valuation_number),
                user: user_name(&users, valuation.prepared_by),
                occurred_at: valuation.created_at,
            })
            .collect();

        entries.extend(
            self.store
                .transfers(&TransferFilter::default())?
                .into_iter()
                .take(RECENT_ACTIVITY_PER_SOURCE)
                .map(|transfer| {
                    let from = user_name(&users, transfer.from_user_id);
                    ActivityEntry {
                        kind: ActivityKind::TransferCreated,
                        description: format!(
                            "valuation transferred from {} to {}",
                            from,
                            user_name(&users, transfer.to_user_id)
                        ),
                        user: from,
                        occurred_at: transfer.requested_at,
                    }
                }),
        );

        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        entries.truncate(RECENT_ACTIVITY_LIMIT);
        Ok(entries)
    }

    /// CSV of active valuations, optionally restricted to one status.
    pub fn export_csv(&self, status: Option<ValuationStatus>) -> Result<Vec<u8>, StatisticsError> {
        let mut filter = ValuationFilter::active();
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        let valuations = self.store.valuations(&filter)?;
        let users = self.user_index()?;
        let clients = self
            .store
            .clients(None)?
            .into_iter()
            .map(|client| (client.id, client))
            .collect();
        let bytes = valuations_csv(&valuations, &users, &clients)?;
        debug!(rows = valuations.len(), bytes = bytes.len(), "valuation csv exported");
        Ok(bytes)
    }

    fn user_index(&self) -> Result<HashMap<UserId, User>, RepositoryError> {
        Ok(self
            .store
            .users()?
            .into_iter()
            .map(|user| (user.id, user))
            .collect())
    }
}

fn user_name(users: &HashMap<UserId, User>, id: UserId) -> String {
    users
        .get(&id)
        .map_or_else(|| format!("user {id}"), |user| user.name.clone())
}

fn valuation_title(valuation: &Valuation) -> String {
    let reference = valuation
        .report
        .reference_number
        .clone()
        .unwrap_or_else(|| valuation.valuation_number.clone());
    let location = valuation.property.location_label();
    if location.is_empty() {
        reference
    } else {
        format!("{reference} - {location}")
    }
}

/// Valuations created in the trailing twelve months, newest month first.
pub fn monthly_counts(valuations: &[Valuation], now: DateTime<Utc>) -> Vec<MonthlyCount> {
    let since = now
        .checked_sub_months(Months::new(MONTHLY_WINDOW))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for valuation in valuations.iter().filter(|valuation| valuation.created_at >= since) {
        let created = valuation.created_at;
        *buckets.entry((created.year(), created.month())).or_default() += 1;
    }
    buckets
        .into_iter()
        .rev()
        .map(|((year, month), count)| MonthlyCount {
            year,
            month,
            count,
            label: format!("{} {year}", month_name(month)),
        })
        .collect()
}

/// Most common property type first; unset types are grouped as `unspecified`.
pub fn property_type_counts(valuations: &[Valuation]) -> Vec<PropertyTypeCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for valuation in valuations {
        let kind = valuation
            .property
            .property_type
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        *counts.entry(kind).or_default() += 1;
    }
    let mut counts: Vec<PropertyTypeCount> = counts
        .into_iter()
        .map(|(property_type, count)| PropertyTypeCount {
            property_type,
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[derive(Debug, thiserror::Error)]
pub enum StatisticsError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<StatisticsError> for ApiError {
    fn from(value: StatisticsError) -> Self {
        match value {
            StatisticsError::Export(err) => ApiError::internal(ErrorCode::InternalError, &err),
            StatisticsError::Repository(err) => err.into(),
        }
    }
}
