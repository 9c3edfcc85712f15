//! Application state

use std::sync::Arc;

use crate::auth::JwtService;
use crate::billing::BillingService;
use crate::config::{Config, StoreBackend};
use crate::db::{BillingStore, MemoryBillingStore, PgBillingStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub billing: BillingService,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(billing: BillingService, jwt: JwtService) -> Self {
        Self { billing, jwt }
    }

    /// Open the configured store and wire the services on top of it
    pub async fn from_config(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn BillingStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set")?;
                let store = PgBillingStore::connect(url).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory billing store; data is lost on restart");
                Arc::new(MemoryBillingStore::new())
            }
        };

        Ok(Self::new(
            BillingService::new(store, config.pricing),
            JwtService::with_config(config.jwt_config()),
        ))
    }
}
