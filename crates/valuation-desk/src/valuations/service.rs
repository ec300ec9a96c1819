use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{NewValuation, Valuation, ValuationId, ValuationStatus, ValuationUpdate};
use super::repository::{ValuationFilter, ValuationRepository};
use crate::api::ApiError;
use crate::geo::GeoPoint;
use crate::identity::{Caller, ClientId, IdentityRepository, UserId};
use crate::pagination::{Page, PageRequest};
use crate::reports::{TemplateRepository, ToWhomTypeId};
use crate::store::RepositoryError;
use crate::validation::ValidationErrors;

static VALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// `VAL-YYYYMMDD-` followed by a sixteen digit sequence.
pub fn next_valuation_number(now: DateTime<Utc>) -> String {
    let seq = VALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("VAL-{}-{seq:016}", now.format("%Y%m%d"))
}

/// Valuation intake, updates, listing, and soft deactivation.
pub struct ValuationService<S> {
    store: Arc<S>,
}

impl<S> ValuationService<S>
where
    S: ValuationRepository + IdentityRepository + TemplateRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        caller: &Caller,
        request: NewValuation,
    ) -> Result<Valuation, ValuationError> {
        let mut errors = ValidationErrors::new();
        let status = request.status.unwrap_or(ValuationStatus::Pending);
        if !status.is_intake() {
            errors.add("status", "a new valuation must start as draft or pending");
        }
        let prepared_by = request.prepared_by.unwrap_or(caller.id);
        self.check_user(&mut errors, "prepared_by", Some(prepared_by))?;
        self.check_user(&mut errors, "inspected_by", request.inspected_by)?;
        self.check_client(&mut errors, request.client_id)?;
        self.check_to_whom(&mut errors, request.to_whom_type_id)?;
        let location = location_from(&mut errors, request.latitude, request.longitude);
        check_areas(&mut errors, &request.property);
        errors.into_result()?;

        let now = Utc::now();
        let valuation = Valuation {
            id: ValuationId(0),
            valuation_number: next_valuation_number(now),
            status,
            prepared_by,
            inspected_by: request.inspected_by,
            client_id: request.client_id,
            to_whom_type_id: request.to_whom_type_id,
            property: request.property,
            results: request.results,
            report: request.report,
            location,
            is_active: true,
            transferred_at: None,
            transfer_notes: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert_valuation(valuation)?;
        info!(
            valuation = %stored.id,
            number = %stored.valuation_number,
            preparer = %stored.prepared_by,
            "valuation created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: ValuationId) -> Result<Valuation, ValuationError> {
        Ok(self
            .store
            .valuation(id)?
            .ok_or(RepositoryError::NotFound("valuation"))?)
    }

    pub fn update(
        &self,
        id: ValuationId,
        update: ValuationUpdate,
    ) -> Result<Valuation, ValuationError> {
        let mut valuation = self.get(id)?;
        if !valuation.is_active {
            return Err(ValuationError::Conflict("the valuation has been deactivated"));
        }

        let mut errors = ValidationErrors::new();
        self.check_user(&mut errors, "inspected_by", update.inspected_by)?;
        self.check_client(&mut errors, update.client_id)?;
        self.check_to_whom(&mut errors, update.to_whom_type_id)?;
        let location = if update.latitude.is_some() || update.longitude.is_some() {
            location_from(&mut errors, update.latitude, update.longitude)
        } else {
            valuation.location
        };
        if let Some(property) = &update.property {
            check_areas(&mut errors, property);
        }
        errors.into_result()?;

        if let Some(status) = update.status {
            valuation.status = status;
        }
        if update.inspected_by.is_some() {
            valuation.inspected_by = update.inspected_by;
        }
        if update.client_id.is_some() {
            valuation.client_id = update.client_id;
        }
        if update.to_whom_type_id.is_some() {
            valuation.to_whom_type_id = update.to_whom_type_id;
        }
        if let Some(property) = update.property {
            valuation.property = property;
        }
        if let Some(results) = update.results {
            valuation.results = results;
        }
        if let Some(report) = update.report {
            valuation.report = report;
        }
        valuation.location = location;
        valuation.updated_at = Utc::now();

        let stored = self.store.update_valuation(valuation)?;
        info!(valuation = %stored.id, status = stored.status.label(), "valuation updated");
        Ok(stored)
    }

    /// Active valuations, newest first.
    pub fn list(
        &self,
        status: Option<ValuationStatus>,
        page: PageRequest,
    ) -> Result<Page<Valuation>, ValuationError> {
        let mut filter = ValuationFilter::active();
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        Ok(Page::paginate(self.store.valuations(&filter)?, page))
    }

    /// Soft delete: the record stays for transfers and statistics.
    pub fn deactivate(&self, id: ValuationId) -> Result<Valuation, ValuationError> {
        let mut valuation = self.get(id)?;
        if !valuation.is_active {
            return Ok(valuation);
        }
        valuation.is_active = false;
        valuation.updated_at = Utc::now();
        let stored = self.store.update_valuation(valuation)?;
        info!(valuation = %stored.id, "valuation deactivated");
        Ok(stored)
    }

    fn check_user(
        &self,
        errors: &mut ValidationErrors,
        field: &'static str,
        user: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        if let Some(user) = user {
            match IdentityRepository::user(self.store.as_ref(), user)? {
                Some(found) if found.is_active => {}
                Some(_) => errors.add(field, format!("user {user} is inactive")),
                None => errors.add(field, format!("user {user} does not exist")),
            }
        }
        Ok(())
    }

    fn check_client(
        &self,
        errors: &mut ValidationErrors,
        client: Option<ClientId>,
    ) -> Result<(), RepositoryError> {
        if let Some(client) = client {
            if self.store.client(client)?.is_none() {
                errors.add("client_id", format!("client {client} does not exist"));
            }
        }
        Ok(())
    }

    fn check_to_whom(
        &self,
        errors: &mut ValidationErrors,
        to_whom: Option<ToWhomTypeId>,
    ) -> Result<(), RepositoryError> {
        if let Some(to_whom) = to_whom {
            if self.store.to_whom_type(to_whom)?.is_none() {
                errors.add(
                    "to_whom_type_id",
                    format!("recipient type {to_whom} does not exist"),
                );
            }
        }
        Ok(())
    }
}

fn location_from(
    errors: &mut ValidationErrors,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            errors.range("latitude", latitude, -90.0, 90.0);
            errors.range("longitude", longitude, -180.0, 180.0);
            Some(GeoPoint::new(latitude, longitude))
        }
        (None, None) => None,
        (Some(_), None) => {
            errors.add("longitude", "the longitude is required with a latitude");
            None
        }
        (None, Some(_)) => {
            errors.add("latitude", "the latitude is required with a longitude");
            None
        }
    }
}

fn check_areas(errors: &mut ValidationErrors, property: &super::domain::PropertyDetails) {
    let areas = [
        ("land_area", property.land_area),
        ("building_area", property.building_area),
        ("basement_area", property.basement_area),
        ("attachments_area", property.attachments_area),
    ];
    for (field, area) in areas {
        if area.is_some_and(|area| area < 0.0) {
            errors.add(field, format!("the {field} must be at least 0"));
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ValuationError> for ApiError {
    fn from(value: ValuationError) -> Self {
        match value {
            ValuationError::Validation(errors) => ApiError::validation(errors),
            ValuationError::Conflict(reason) => ApiError::conflict(reason),
            ValuationError::Repository(err) => err.into(),
        }
    }
}
