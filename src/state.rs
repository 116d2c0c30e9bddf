use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::assignment::Assigner;
use crate::services::store::sqlite::SqliteStore;
use crate::services::store::BookingStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub store: Arc<dyn BookingStore>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        let db = Arc::new(Mutex::new(conn));
        let store: Arc<dyn BookingStore> = Arc::new(SqliteStore::new(Arc::clone(&db)));
        Self { db, config, store }
    }

    pub fn assigner(&self) -> Assigner {
        Assigner::new(Arc::clone(&self.store))
    }
}
