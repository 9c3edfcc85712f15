//! Shared types for the mess billing service
//!
//! Common types used by the server and its clients: the error system,
//! billing models, and the request/response payloads of the billing API.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
