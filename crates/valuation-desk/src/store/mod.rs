//! Persistence seam shared by every component.
//!
//! Each component declares its own repository trait next to its service; [`MemoryStore`]
//! implements all of them over one lock so multi-record units of work stay atomic.

pub mod memory;

pub use memory::MemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
