//! Data models
//!
//! Shared between the billing server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are UUIDs issued by the hosted auth/database service.

pub mod bill;
pub mod meal;
pub mod payment;

// Re-exports
pub use bill::*;
pub use meal::*;
pub use payment::*;
