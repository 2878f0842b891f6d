pub mod config;
pub mod controllers;
pub mod core;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod store;

use std::sync::Arc;

use crate::core::dashboard::DashboardAggregator;
use crate::core::ledger::OccupancyLedger;
use crate::core::registry::SeatRegistry;
use crate::store::postgres::PgRecordStore;
use crate::store::RecordStore;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub store: Arc<dyn RecordStore>,
    pub ledger: OccupancyLedger,
    pub registry: SeatRegistry,
    pub dashboard: DashboardAggregator,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::connect(&config.database).await?;

        db.run_migrations().await?;

        let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(db.clone()));
        let layout = config.seating.layout();
        let state = Arc::new(Self {
            db,
            ledger: OccupancyLedger::new(store.clone(), layout.clone()),
            registry: SeatRegistry::new(store.clone(), layout.clone()),
            dashboard: DashboardAggregator::new(store.clone(), layout),
            store,
            config,
        });

        Ok(state)
    }
}
