//! Shared HTTP plumbing: the response envelope, the closed error-code set, enveloped request
//! extractors, and caller authentication.

pub mod auth;
pub mod envelope;
pub mod extract;

pub use auth::{authenticate, bearer_token, IdentityProvider};
pub use envelope::{ApiError, ApiResult, Envelope, ErrorCode};
pub use extract::{ApiJson, ApiPath, ApiQuery};
