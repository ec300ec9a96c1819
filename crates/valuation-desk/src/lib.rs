pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod identity;
pub mod pagination;
pub mod reports;
pub mod sketches;
pub mod statistics;
pub mod store;
pub mod telemetry;
pub mod transfers;
pub mod validation;
pub mod valuations;
