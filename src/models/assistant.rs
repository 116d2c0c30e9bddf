use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assistant {
    pub id: String,
    pub name: String,
    pub station_code: String,
    pub station_name: String,
    pub verified: bool,
    pub application_status: ApplicationStatus,
    /// Currently taking new bookings.
    pub eligible: bool,
    pub revoked: bool,
    pub created_at: NaiveDateTime,
}

impl Assistant {
    /// Exact on code, case-insensitive on name.
    pub fn works_at(&self, station: &str) -> bool {
        self.station_code == station || self.station_name.to_lowercase() == station.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}
