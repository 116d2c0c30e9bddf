use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub passenger_name: Option<String>,
    pub station_code: String,
    pub station_name: String,
    pub pickup_station_code: Option<String>,
    pub drop_station_code: Option<String>,
    pub status: BookingStatus,
    pub assistant_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Still waiting for a match: searching and nobody attached yet.
    pub fn is_awaiting_assignment(&self) -> bool {
        self.status == BookingStatus::Searching && self.assistant_id.is_none()
    }

    /// Exact on code, case-insensitive on name.
    pub fn at_station(&self, station: &str) -> bool {
        self.station_code == station || self.station_name.to_lowercase() == station.to_lowercase()
    }
}

/// Fields a passenger supplies when asking for help.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub passenger_name: Option<String>,
    pub station_code: String,
    pub station_name: String,
    pub pickup_station_code: Option<String>,
    pub drop_station_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[serde(alias = "PENDING", alias = "Pending", alias = "pending")]
    Searching,
    Assigned,
    AssistantEnRoute,
    InProgress,
    Completed,
    Cancelled,
    Emergency,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        BookingStatus::Searching,
        BookingStatus::Assigned,
        BookingStatus::AssistantEnRoute,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Searching => "SEARCHING",
            BookingStatus::Assigned => "ASSIGNED",
            BookingStatus::AssistantEnRoute => "ASSISTANT_EN_ROUTE",
            BookingStatus::InProgress => "IN_PROGRESS",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Emergency => "EMERGENCY",
        }
    }

    /// Case-insensitive. Older rows written as "Pending" read back as `Searching`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SEARCHING" | "PENDING" => Some(BookingStatus::Searching),
            "ASSIGNED" => Some(BookingStatus::Assigned),
            "ASSISTANT_EN_ROUTE" => Some(BookingStatus::AssistantEnRoute),
            "IN_PROGRESS" => Some(BookingStatus::InProgress),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "EMERGENCY" => Some(BookingStatus::Emergency),
            _ => None,
        }
    }

    /// Upper-cased values a row in this state may carry on disk.
    pub fn stored_forms(&self) -> &'static [&'static str] {
        match self {
            BookingStatus::Searching => &["SEARCHING", "PENDING"],
            BookingStatus::Assigned => &["ASSIGNED"],
            BookingStatus::AssistantEnRoute => &["ASSISTANT_EN_ROUTE"],
            BookingStatus::InProgress => &["IN_PROGRESS"],
            BookingStatus::Completed => &["COMPLETED"],
            BookingStatus::Cancelled => &["CANCELLED"],
            BookingStatus::Emergency => &["EMERGENCY"],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Emergency
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
