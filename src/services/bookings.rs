use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AssignmentError;
use crate::models::{Booking, BookingStatus, NewBooking};
use crate::services::lifecycle;
use crate::services::store::BookingStore;

/// Records a passenger's request. New bookings always start out searching.
pub fn create_booking(conn: &Connection, request: NewBooking) -> anyhow::Result<Booking> {
    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        passenger_name: request.passenger_name,
        station_code: request.station_code,
        station_name: request.station_name,
        pickup_station_code: request.pickup_station_code,
        drop_station_code: request.drop_station_code,
        status: BookingStatus::Searching,
        assistant_id: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_booking(conn, &booking)?;

    tracing::info!(booking_id = %booking.id, station = %booking.station_code, "booking created");
    Ok(booking)
}

/// Moves a booking along its lifecycle, keeping whichever assistant it has.
/// Attaching an assistant only happens through a matching sweep.
pub async fn transition_booking(
    store: &dyn BookingStore,
    id: &str,
    next: BookingStatus,
) -> Result<Booking, AssignmentError> {
    let booking = store
        .get_booking(id)
        .await
        .map_err(AssignmentError::persistence)?
        .ok_or_else(|| AssignmentError::BookingNotFound(id.to_string()))?;

    if let Err(e) = lifecycle::check_transition(booking.status, next) {
        tracing::warn!(booking_id = %id, error = %e, "rejected status change");
        return Err(e);
    }
    if next == BookingStatus::Assigned {
        return Err(AssignmentError::AssistantRequired(id.to_string()));
    }

    let updated = store
        .conditional_update_booking(id, booking.status, next, None)
        .await
        .map_err(AssignmentError::persistence)?;
    if !updated {
        return Err(AssignmentError::ConcurrentModification(id.to_string()));
    }

    tracing::info!(booking_id = %id, from = %booking.status, to = %next, "booking status changed");

    store
        .get_booking(id)
        .await
        .map_err(AssignmentError::persistence)?
        .ok_or_else(|| AssignmentError::BookingNotFound(id.to_string()))
}

pub async fn cancel_booking(store: &dyn BookingStore, id: &str) -> Result<Booking, AssignmentError> {
    transition_booking(store, id, BookingStatus::Cancelled).await
}
