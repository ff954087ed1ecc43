//! Application state for market-server

use std::sync::Arc;

use crate::config::Config;
use crate::db::{MarketStore, MemoryStore, PgStore};
use crate::services::pricing::{OrderNumberGenerator, RandomOrderNumbers};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL or in-memory)
    pub store: Arc<dyn MarketStore>,
    /// JWT secret for bearer authentication
    pub jwt_secret: String,
    /// Order number source
    pub order_numbers: Arc<dyn OrderNumberGenerator>,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn MarketStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url, config.db_max_connections).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(
            store,
            config.jwt_secret.clone(),
            Arc::new(RandomOrderNumbers::from_entropy()),
        ))
    }

    pub fn with_store(
        store: Arc<dyn MarketStore>,
        jwt_secret: impl Into<String>,
        order_numbers: Arc<dyn OrderNumberGenerator>,
    ) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            order_numbers,
        }
    }
}
