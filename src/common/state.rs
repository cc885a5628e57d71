use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::alerting::{AlertStore, SeaOrmStore};
use crate::config::Config;
use crate::device::DeviceClient;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub device_client: Arc<DeviceClient>,
    /// Storage used by the alert engine and reading ingestion.
    pub store: Arc<dyn AlertStore>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, device_client: DeviceClient) -> Self {
        let store = Arc::new(SeaOrmStore::new(db.clone()));
        Self::with_store(db, config, device_client, store)
    }

    /// Build a state whose alert engine runs against `store` instead of `db`.
    pub fn with_store(
        db: DatabaseConnection,
        config: Config,
        device_client: DeviceClient,
        store: Arc<dyn AlertStore>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            device_client: Arc::new(device_client),
            store,
        }
    }
}
