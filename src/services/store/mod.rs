pub mod sqlite;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::models::{Assistant, Booking, BookingStatus};

/// Persistence collaborator for the matching core. Implementations must make
/// `conditional_update_booking` a single atomic check-and-write.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_bookings_awaiting_assignment(&self, station: &str) -> anyhow::Result<Vec<Booking>>;

    async fn find_eligible_assistant(&self, station: &str) -> anyhow::Result<Option<Assistant>>;

    async fn conditional_update_booking(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        assistant_id: Option<&str>,
    ) -> anyhow::Result<bool>;

    async fn distinct_stations_with_awaiting_bookings(&self) -> anyhow::Result<BTreeSet<String>>;

    async fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>>;
}
