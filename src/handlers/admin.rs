use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::assignment::{AllStationsReport, StationAssignment};
use crate::services::bookings;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(raw).ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub station: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    passenger_name: Option<String>,
    station_code: String,
    station_name: String,
    pickup_station_code: Option<String>,
    drop_station_code: Option<String>,
    status: BookingStatus,
    assistant_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<crate::models::Booking> for BookingResponse {
    fn from(b: crate::models::Booking) -> Self {
        Self {
            id: b.id,
            passenger_name: b.passenger_name,
            station_code: b.station_code,
            station_name: b.station_name,
            pickup_station_code: b.pickup_station_code,
            drop_station_code: b.drop_station_code,
            status: b.status,
            assistant_id: b.assistant_id,
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let bookings = {
        let db = state
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))?;
        queries::list_bookings(&db, query.station.as_deref(), status, limit)?
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let next = parse_status(&body.status)?;
    let booking = bookings::transition_booking(state.store.as_ref(), &id, next).await?;
    Ok(Json(booking.into()))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = bookings::cancel_booking(state.store.as_ref(), &id).await?;
    Ok(Json(booking.into()))
}

// POST /api/admin/assign/:station
pub async fn assign_station(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(station): Path<String>,
) -> Result<Json<StationAssignment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let result = state.assigner().assign_station(&station).await?;
    Ok(Json(result))
}

// POST /api/admin/assign
pub async fn assign_all_stations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AllStationsReport>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let report = state.assigner().assign_all_stations().await?;
    Ok(Json(report))
}
