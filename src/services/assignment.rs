use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::errors::AssignmentError;
use crate::models::BookingStatus;
use crate::services::store::BookingStore;
use crate::services::{lifecycle, matcher};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SweepOutcome {
    Assigned,
    NothingToAssign,
    NoEligibleAssistant,
    /// The store failed partway; the counts cover what was written before.
    Interrupted,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SkipReason {
    InvalidTransition,
    ConcurrentModification,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedBooking {
    pub booking_id: String,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationAssignment {
    pub station: String,
    pub outcome: SweepOutcome,
    pub assistant_id: Option<String>,
    pub assigned_count: usize,
    pub skipped: Vec<SkippedBooking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StationAssignment {
    fn empty(station: &str, outcome: SweepOutcome) -> Self {
        Self {
            station: station.to_string(),
            outcome,
            assistant_id: None,
            assigned_count: 0,
            skipped: vec![],
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    pub station: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<StationAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllStationsReport {
    pub per_station: Vec<StationReport>,
    pub total_assigned: usize,
}

/// Drives matching sweeps against a shared store handle.
#[derive(Clone)]
pub struct Assigner {
    store: Arc<dyn BookingStore>,
}

impl Assigner {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Matches every unassigned searching booking at `station` to the
    /// station's eligible assistant. Each booking is claimed with its own
    /// conditional update; bookings that changed underneath are skipped.
    ///
    /// A store failure before anything is written is returned as an error.
    /// Once claims have started, a failure stops the sweep and comes back as
    /// an `Interrupted` result that still counts the bookings already assigned.
    pub async fn assign_station(&self, station: &str) -> Result<StationAssignment, AssignmentError> {
        let awaiting = self
            .store
            .find_bookings_awaiting_assignment(station)
            .await
            .map_err(AssignmentError::persistence)?;

        if awaiting.is_empty() {
            return Ok(StationAssignment::empty(station, SweepOutcome::NothingToAssign));
        }

        let assistant = match matcher::find_assistant(self.store.as_ref(), station).await {
            Ok(assistant) => assistant,
            Err(AssignmentError::NoEligibleAssistant(_)) => {
                tracing::info!(
                    station = %station,
                    waiting = awaiting.len(),
                    "no eligible assistant"
                );
                return Ok(StationAssignment::empty(station, SweepOutcome::NoEligibleAssistant));
            }
            Err(e) => return Err(e),
        };

        let mut result = StationAssignment::empty(station, SweepOutcome::Assigned);
        result.assistant_id = Some(assistant.id.clone());

        for booking in awaiting {
            if let Err(e) = lifecycle::check_transition(booking.status, BookingStatus::Assigned) {
                tracing::warn!(booking_id = %booking.id, error = %e, "skipping booking");
                result.skipped.push(SkippedBooking {
                    booking_id: booking.id,
                    reason: SkipReason::InvalidTransition,
                    detail: e.to_string(),
                });
                continue;
            }

            let claimed = match self
                .store
                .conditional_update_booking(
                    &booking.id,
                    booking.status,
                    BookingStatus::Assigned,
                    Some(&assistant.id),
                )
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    let e = AssignmentError::persistence(e);
                    tracing::error!(
                        station = %station,
                        booking_id = %booking.id,
                        assigned = result.assigned_count,
                        error = %e,
                        "sweep interrupted"
                    );
                    result.outcome = SweepOutcome::Interrupted;
                    result.error = Some(e.to_string());
                    break;
                }
            };

            if claimed {
                tracing::info!(
                    booking_id = %booking.id,
                    assistant_id = %assistant.id,
                    station = %station,
                    "booking assigned"
                );
                result.assigned_count += 1;
            } else {
                let e = AssignmentError::ConcurrentModification(booking.id.clone());
                tracing::warn!(booking_id = %booking.id, error = %e, "skipping booking");
                result.skipped.push(SkippedBooking {
                    booking_id: booking.id,
                    reason: SkipReason::ConcurrentModification,
                    detail: e.to_string(),
                });
            }
        }

        Ok(result)
    }

    /// Sweeps every station that has waiting bookings, one task per station.
    /// A failing station is reported in its entry and does not stop the rest.
    pub async fn assign_all_stations(&self) -> Result<AllStationsReport, AssignmentError> {
        let stations = self
            .store
            .distinct_stations_with_awaiting_bookings()
            .await
            .map_err(AssignmentError::persistence)?;

        let mut tasks = JoinSet::new();
        let mut task_stations = HashMap::new();
        for station in stations {
            let assigner = self.clone();
            let name = station.clone();
            let handle = tasks.spawn(async move { assigner.assign_station(&name).await });
            task_stations.insert(handle.id(), station);
        }

        let mut per_station = vec![];
        while let Some(joined) = tasks.join_next_with_id().await {
            let id = match &joined {
                Ok((id, _)) => *id,
                Err(e) => e.id(),
            };
            let station = task_stations.remove(&id).unwrap_or_default();

            let report = match joined {
                Ok((_, Ok(assignment))) => StationReport {
                    station,
                    error: assignment.error.clone(),
                    assignment: Some(assignment),
                },
                Ok((_, Err(e))) => {
                    tracing::error!(station = %station, error = %e, "station sweep failed");
                    StationReport {
                        station,
                        assignment: None,
                        error: Some(e.to_string()),
                    }
                }
                Err(e) => {
                    tracing::error!(station = %station, error = %e, "station sweep task aborted");
                    StationReport {
                        station,
                        assignment: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            per_station.push(report);
        }
        per_station.sort_by(|a, b| a.station.cmp(&b.station));

        let total_assigned = per_station
            .iter()
            .filter_map(|r| r.assignment.as_ref())
            .map(|a| a.assigned_count)
            .sum();

        Ok(AllStationsReport {
            per_station,
            total_assigned,
        })
    }
}
