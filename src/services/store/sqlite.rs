use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Assistant, Booking, BookingStatus};
use crate::services::eligibility;
use crate::services::store::BookingStore;

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn find_bookings_awaiting_assignment(&self, station: &str) -> anyhow::Result<Vec<Booking>> {
        let db = self.conn()?;
        queries::find_bookings_awaiting_assignment(&db, station)
    }

    async fn find_eligible_assistant(&self, station: &str) -> anyhow::Result<Option<Assistant>> {
        let candidates = {
            let db = self.conn()?;
            queries::find_assistants_at_station(&db, station)?
        };
        Ok(eligibility::select_eligible(candidates, station))
    }

    async fn conditional_update_booking(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        assistant_id: Option<&str>,
    ) -> anyhow::Result<bool> {
        let db = self.conn()?;
        queries::conditional_update_booking(&db, id, expected, next, assistant_id)
    }

    async fn distinct_stations_with_awaiting_bookings(&self) -> anyhow::Result<BTreeSet<String>> {
        let db = self.conn()?;
        queries::distinct_stations_with_awaiting_bookings(&db)
    }

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        let db = self.conn()?;
        queries::get_booking_by_id(&db, id)
    }
}
