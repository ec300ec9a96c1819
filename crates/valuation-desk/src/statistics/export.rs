use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::identity::{Client, ClientId, User, UserId};
use crate::valuations::Valuation;

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Flush(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "failed to write valuation CSV: {}", err),
            ExportError::Flush(detail) => write!(f, "failed to flush valuation CSV: {}", detail),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Csv(err) => Some(err),
            ExportError::Flush(_) => None,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Serialize)]
struct ValuationRow<'a> {
    valuation_number: &'a str,
    reference_number: &'a str,
    status: &'static str,
    prepared_by: &'a str,
    client: &'a str,
    property_type: &'a str,
    location: String,
    land_area: Option<f64>,
    total_building_area: f64,
    final_value: Option<f64>,
    active: bool,
    created_at: String,
}

/// Writes one header row plus one row per valuation.
pub fn valuations_csv(
    valuations: &[Valuation],
    users: &HashMap<UserId, User>,
    clients: &HashMap<ClientId, Client>,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    for valuation in valuations {
        let preparer = users
            .get(&valuation.prepared_by)
            .map_or("", |user| user.name.as_str());
        let client = valuation
            .client_id
            .and_then(|id| clients.get(&id))
            .map_or("", |client| client.name.as_str());
        writer.serialize(ValuationRow {
            valuation_number: &valuation.valuation_number,
            reference_number: valuation.report.reference_number.as_deref().unwrap_or(""),
            status: valuation.status.label(),
            prepared_by: preparer,
            client,
            property_type: valuation.property.property_type.as_deref().unwrap_or(""),
            location: valuation.property.location_label(),
            land_area: valuation.property.land_area,
            total_building_area: valuation.property.total_building_area(),
            final_value: valuation.results.final_value,
            active: valuation.is_active,
            created_at: valuation.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))
}
