use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};

use crate::models::{ApplicationStatus, Assistant, Booking, BookingStatus};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, passenger_name, station_code, station_name, pickup_station_code, \
     drop_station_code, status, assistant_id, created_at, updated_at";

/// Matches a station argument exactly on code or case-insensitively on name.
const STATION_MATCH: &str = "(station_code = ?1 OR lower(station_name) = lower(?1))";

fn now_str() -> String {
    Utc::now().naive_utc().format(TIME_FORMAT).to_string()
}

fn status_in(status: BookingStatus) -> String {
    let forms: Vec<String> = status
        .stored_forms()
        .iter()
        .map(|f| format!("'{f}'"))
        .collect();
    format!("upper(status) IN ({})", forms.join(", "))
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format(TIME_FORMAT).to_string();
    let updated_at = booking.updated_at.format(TIME_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (id, passenger_name, station_code, station_name, pickup_station_code,
                               drop_station_code, status, assistant_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.passenger_name,
            booking.station_code,
            booking.station_name,
            booking.pickup_station_code,
            booking.drop_station_code,
            booking.status.as_str(),
            booking.assistant_id,
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    station: Option<&str>,
    status: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE 1 = 1");
    let mut values: Vec<Value> = vec![];

    if let Some(station) = station {
        values.push(Value::Text(station.to_string()));
        let n = values.len();
        sql.push_str(&format!(
            " AND (station_code = ?{n} OR lower(station_name) = lower(?{n}))"
        ));
    }
    if let Some(status) = status {
        sql.push_str(&format!(" AND {}", status_in(status)));
    }
    values.push(Value::Integer(limit));
    sql.push_str(&format!(" ORDER BY created_at DESC, id ASC LIMIT ?{}", values.len()));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Searching bookings at the station with nobody attached, oldest first.
pub fn find_bookings_awaiting_assignment(
    conn: &Connection,
    station: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE {STATION_MATCH} AND {} AND assistant_id IS NULL
         ORDER BY created_at ASC, id ASC",
        status_in(BookingStatus::Searching)
    ))?;

    let rows = stmt.query_map(params![station], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn distinct_stations_with_awaiting_bookings(
    conn: &Connection,
) -> anyhow::Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT station_code FROM bookings WHERE {} AND assistant_id IS NULL",
        status_in(BookingStatus::Searching)
    ))?;

    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut stations = BTreeSet::new();
    for row in rows {
        stations.insert(row?);
    }
    Ok(stations)
}

/// Compare-and-swap on status. When `assistant_id` is given the row must not
/// already have one; otherwise the existing assistant is kept.
pub fn conditional_update_booking(
    conn: &Connection,
    id: &str,
    expected: BookingStatus,
    next: BookingStatus,
    assistant_id: Option<&str>,
) -> anyhow::Result<bool> {
    let mut sql = format!(
        "UPDATE bookings SET status = ?1, assistant_id = COALESCE(?2, assistant_id), updated_at = ?3
         WHERE id = ?4 AND {}",
        status_in(expected)
    );
    if assistant_id.is_some() {
        sql.push_str(" AND assistant_id IS NULL");
    }

    let count = conn.execute(&sql, params![next.as_str(), assistant_id, now_str(), id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let passenger_name: Option<String> = row.get(1)?;
    let station_code: String = row.get(2)?;
    let station_name: String = row.get(3)?;
    let pickup_station_code: Option<String> = row.get(4)?;
    let drop_station_code: Option<String> = row.get(5)?;
    let status_str: String = row.get(6)?;
    let assistant_id: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("booking {id} has unknown status {status_str:?}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIME_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, TIME_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        passenger_name,
        station_code,
        station_name,
        pickup_station_code,
        drop_station_code,
        status,
        assistant_id,
        created_at,
        updated_at,
    })
}

// ── Assistants ──

pub fn create_assistant(conn: &Connection, assistant: &Assistant) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO assistants (id, name, station_code, station_name, verified,
                                 application_status, eligible, revoked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            assistant.id,
            assistant.name,
            assistant.station_code,
            assistant.station_name,
            assistant.verified,
            assistant.application_status.as_str(),
            assistant.eligible,
            assistant.revoked,
            assistant.created_at.format(TIME_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Every assistant registered at the station regardless of flags, ordered by id.
pub fn find_assistants_at_station(
    conn: &Connection,
    station: &str,
) -> anyhow::Result<Vec<Assistant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, station_code, station_name, verified, application_status,
                eligible, revoked, created_at
         FROM assistants WHERE {STATION_MATCH} ORDER BY id ASC"
    ))?;

    let rows = stmt.query_map(params![station], |row| {
        let created_at_str: String = row.get(8)?;
        let application_status: String = row.get(5)?;
        Ok(Assistant {
            id: row.get(0)?,
            name: row.get(1)?,
            station_code: row.get(2)?,
            station_name: row.get(3)?,
            verified: row.get(4)?,
            application_status: ApplicationStatus::parse(&application_status),
            eligible: row.get(6)?,
            revoked: row.get(7)?,
            created_at: NaiveDateTime::parse_from_str(&created_at_str, TIME_FORMAT)
                .unwrap_or_else(|_| Utc::now().naive_utc()),
        })
    })?;

    let mut assistants = vec![];
    for row in rows {
        assistants.push(row?);
    }
    Ok(assistants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn booking(id: &str, station: &str, status: BookingStatus) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: id.to_string(),
            passenger_name: Some("Ada".to_string()),
            station_code: station.to_string(),
            station_name: format!("{station} Central"),
            pickup_station_code: None,
            drop_station_code: None,
            status,
            assistant_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_awaiting_includes_legacy_pending_rows() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();
        create_booking(&conn, &booking("b2", "WL", BookingStatus::Cancelled)).unwrap();
        conn.execute(
            "INSERT INTO bookings (id, station_code, station_name, status, created_at, updated_at)
             VALUES ('b3', 'WL', 'WL Central', 'Pending', '2025-01-01 00:00:00', '2025-01-01 00:00:00')",
            [],
        )
        .unwrap();

        let awaiting = find_bookings_awaiting_assignment(&conn, "WL").unwrap();
        let ids: Vec<_> = awaiting.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b3", "b1"]);
        assert!(awaiting.iter().all(|b| b.status == BookingStatus::Searching));
    }

    #[test]
    fn test_conditional_update_claims_legacy_pending_row() {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO bookings (id, station_code, station_name, status, created_at, updated_at)
             VALUES ('b3', 'WL', 'WL Central', 'Pending', '2025-01-01 00:00:00', '2025-01-01 00:00:00')",
            [],
        )
        .unwrap();

        let claimed = conditional_update_booking(
            &conn,
            "b3",
            BookingStatus::Searching,
            BookingStatus::Assigned,
            Some("a1"),
        )
        .unwrap();
        assert!(claimed);

        let stored = get_booking_by_id(&conn, "b3").unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Assigned);
        assert_eq!(stored.assistant_id.as_deref(), Some("a1"));
        let raw: String = conn
            .query_row("SELECT status FROM bookings WHERE id = 'b3'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, "ASSIGNED");
    }

    #[test]
    fn test_awaiting_matches_station_name_case_insensitively() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();

        assert_eq!(find_bookings_awaiting_assignment(&conn, "wl central").unwrap().len(), 1);
        assert_eq!(find_bookings_awaiting_assignment(&conn, "wl").unwrap().len(), 0);
    }

    #[test]
    fn test_conditional_update_claims_once() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();

        let first = conditional_update_booking(
            &conn,
            "b1",
            BookingStatus::Searching,
            BookingStatus::Assigned,
            Some("a1"),
        )
        .unwrap();
        let second = conditional_update_booking(
            &conn,
            "b1",
            BookingStatus::Searching,
            BookingStatus::Assigned,
            Some("a2"),
        )
        .unwrap();

        assert!(first);
        assert!(!second);
        let stored = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Assigned);
        assert_eq!(stored.assistant_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_conditional_update_keeps_assistant_when_none_given() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();
        conditional_update_booking(
            &conn,
            "b1",
            BookingStatus::Searching,
            BookingStatus::Assigned,
            Some("a1"),
        )
        .unwrap();

        let moved = conditional_update_booking(
            &conn,
            "b1",
            BookingStatus::Assigned,
            BookingStatus::AssistantEnRoute,
            None,
        )
        .unwrap();

        assert!(moved);
        let stored = get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::AssistantEnRoute);
        assert_eq!(stored.assistant_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_distinct_stations() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();
        create_booking(&conn, &booking("b2", "WL", BookingStatus::Searching)).unwrap();
        create_booking(&conn, &booking("b3", "KGX", BookingStatus::Searching)).unwrap();
        create_booking(&conn, &booking("b4", "EUS", BookingStatus::Completed)).unwrap();

        let stations = distinct_stations_with_awaiting_bookings(&conn).unwrap();
        assert_eq!(stations.into_iter().collect::<Vec<_>>(), vec!["KGX", "WL"]);
    }

    #[test]
    fn test_list_bookings_filters() {
        let conn = db::init_db(":memory:").unwrap();
        create_booking(&conn, &booking("b1", "WL", BookingStatus::Searching)).unwrap();
        create_booking(&conn, &booking("b2", "WL", BookingStatus::Cancelled)).unwrap();
        create_booking(&conn, &booking("b3", "KGX", BookingStatus::Searching)).unwrap();

        assert_eq!(list_bookings(&conn, None, None, 50).unwrap().len(), 3);
        assert_eq!(list_bookings(&conn, Some("WL"), None, 50).unwrap().len(), 2);
        let searching_wl =
            list_bookings(&conn, Some("WL"), Some(BookingStatus::Searching), 50).unwrap();
        assert_eq!(searching_wl.len(), 1);
        assert_eq!(searching_wl[0].id, "b1");
        assert_eq!(list_bookings(&conn, None, None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_status_is_an_error() {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO bookings (id, station_code, station_name, status, created_at, updated_at)
             VALUES ('b1', 'WL', 'WL Central', 'confirmed', '2025-01-01 00:00:00', '2025-01-01 00:00:00')",
            [],
        )
        .unwrap();

        assert!(get_booking_by_id(&conn, "b1").is_err());
    }
}
