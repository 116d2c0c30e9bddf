use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::handlers::admin::BookingResponse;
use crate::models::NewBooking;
use crate::services::bookings;
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    if body.station_code.trim().is_empty() || body.station_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "station_code and station_name are required".to_string(),
        ));
    }

    let booking = {
        let db = state
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))?;
        bookings::create_booking(&db, body)?
    };

    Ok((StatusCode::CREATED, Json(booking.into())))
}
