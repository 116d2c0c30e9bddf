//! In-memory `BookingStore` double for unit tests.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{ApplicationStatus, Assistant, Booking, BookingStatus};
use crate::services::eligibility;
use crate::services::store::BookingStore;

pub fn assistant(id: &str, station: &str) -> Assistant {
    Assistant {
        id: id.to_string(),
        name: format!("Assistant {id}"),
        station_code: station.to_string(),
        station_name: format!("{station} Station"),
        verified: true,
        application_status: ApplicationStatus::Approved,
        eligible: true,
        revoked: false,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn booking(id: &str, station: &str) -> Booking {
    let now = Utc::now().naive_utc();
    Booking {
        id: id.to_string(),
        passenger_name: None,
        station_code: station.to_string(),
        station_name: format!("{station} Station"),
        pickup_station_code: None,
        drop_station_code: None,
        status: BookingStatus::Searching,
        assistant_id: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct Inner {
    bookings: BTreeMap<String, Booking>,
    assistants: Vec<Assistant>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    update_calls: usize,
    fail_update_at: Option<usize>,
    any_assistant: bool,
    cancel_after_load: Vec<String>,
    extra_listed: Vec<Booking>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn add_booking(&self, booking: Booking) {
        let mut inner = self.inner.lock().unwrap();
        inner.bookings.insert(booking.id.clone(), booking);
    }

    pub fn add_assistant(&self, assistant: Assistant) {
        self.inner.lock().unwrap().assistants.push(assistant);
    }

    /// Every lookup touching `station` fails.
    pub fn fail_station(&self, station: &str) {
        self.inner.lock().unwrap().failing.insert(station.to_string());
    }

    /// Loading bookings for `station` panics.
    pub fn panic_station(&self, station: &str) {
        self.inner.lock().unwrap().panicking.insert(station.to_string());
    }

    /// The `nth` conditional update (1-based) and every one after it fail.
    pub fn fail_updates_from(&self, nth: usize) {
        self.inner.lock().unwrap().fail_update_at = Some(nth);
    }

    /// Assistant lookup ignores eligibility flags.
    pub fn return_any_assistant(&self) {
        self.inner.lock().unwrap().any_assistant = true;
    }

    /// Simulates the passenger cancelling right after a sweep loaded the booking.
    pub fn cancel_after_load(&self, id: &str) {
        self.inner.lock().unwrap().cancel_after_load.push(id.to_string());
    }

    /// Lists a booking as awaiting even though it isn't stored as such.
    pub fn list_stale(&self, booking: Booking) {
        self.inner.lock().unwrap().extra_listed.push(booking);
    }

    pub fn booking(&self, id: &str) -> Booking {
        self.inner.lock().unwrap().bookings[id].clone()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_bookings_awaiting_assignment(&self, station: &str) -> anyhow::Result<Vec<Booking>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.panicking.contains(station) {
            // release the lock first so other stations keep working
            drop(inner);
            panic!("store crashed loading {station}");
        }
        if inner.failing.contains(station) {
            anyhow::bail!("store offline for {station}");
        }

        let mut loaded: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.at_station(station) && b.is_awaiting_assignment())
            .cloned()
            .collect();
        loaded.extend(inner.extra_listed.iter().cloned());

        for id in std::mem::take(&mut inner.cancel_after_load) {
            if let Some(b) = inner.bookings.get_mut(&id) {
                b.status = BookingStatus::Cancelled;
            }
        }
        Ok(loaded)
    }

    async fn find_eligible_assistant(&self, station: &str) -> anyhow::Result<Option<Assistant>> {
        let inner = self.inner.lock().unwrap();
        if inner.failing.contains(station) {
            anyhow::bail!("store offline for {station}");
        }

        if inner.any_assistant {
            return Ok(inner
                .assistants
                .iter()
                .find(|a| a.works_at(station))
                .cloned());
        }
        Ok(eligibility::select_eligible(inner.assistants.clone(), station))
    }

    async fn conditional_update_booking(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        assistant_id: Option<&str>,
    ) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.update_calls += 1;
        if inner.fail_update_at.is_some_and(|nth| inner.update_calls >= nth) {
            anyhow::bail!("store offline updating {id}");
        }
        let Some(b) = inner.bookings.get_mut(id) else {
            return Ok(false);
        };
        if b.status != expected || (assistant_id.is_some() && b.assistant_id.is_some()) {
            return Ok(false);
        }

        b.status = next;
        if let Some(assistant_id) = assistant_id {
            b.assistant_id = Some(assistant_id.to_string());
        }
        b.updated_at = Utc::now().naive_utc();
        Ok(true)
    }

    async fn distinct_stations_with_awaiting_bookings(&self) -> anyhow::Result<BTreeSet<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.is_awaiting_assignment())
            .map(|b| b.station_code.clone())
            .collect())
    }

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        Ok(self.inner.lock().unwrap().bookings.get(id).cloned())
    }
}
