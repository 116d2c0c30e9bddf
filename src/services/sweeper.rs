use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::assignment::Assigner;

/// Runs an all-station sweep every `period`, starting immediately.
pub fn spawn(assigner: Assigner, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match assigner.assign_all_stations().await {
                Ok(report) => {
                    let failed = report.per_station.iter().filter(|r| r.error.is_some()).count();
                    tracing::info!(
                        stations = report.per_station.len(),
                        assigned = report.total_assigned,
                        failed,
                        "sweep finished"
                    );
                }
                Err(e) => tracing::error!(error = %e, "sweep could not list stations"),
            }
        }
    })
}
