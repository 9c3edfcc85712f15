//! Mess billing server
//!
//! Monthly meal bills and per-meal payment tracking for a canteen.
//!
//! ```text
//! mess-server/src/
//! ├── api/       # axum routes and handlers
//! ├── auth/      # JWT validation, caller identity
//! ├── billing/   # calculator, allocator, reconciliation, service
//! ├── db/        # BillingStore trait, PostgreSQL and in-memory stores
//! ├── config.rs  # environment configuration
//! ├── error.rs   # service-layer error
//! ├── logger.rs  # tracing setup
//! └── state.rs   # shared application state
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod state;

pub use api::build_app;
pub use auth::{CurrentUser, JwtService};
pub use billing::{BillingPeriod, BillingService, MealPricing};
pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
