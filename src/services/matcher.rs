use crate::errors::AssignmentError;
use crate::models::Assistant;
use crate::services::eligibility;
use crate::services::store::BookingStore;

/// Finds the assistant that should take the station's waiting bookings.
///
/// The store's answer is re-checked against the eligibility rules so a stale
/// or over-broad lookup can never hand out an unqualified assistant.
pub async fn find_assistant(
    store: &dyn BookingStore,
    station: &str,
) -> Result<Assistant, AssignmentError> {
    let candidate = store
        .find_eligible_assistant(station)
        .await
        .map_err(AssignmentError::persistence)?;

    match candidate {
        Some(assistant) if eligibility::is_eligible(&assistant, station) => Ok(assistant),
        Some(assistant) => {
            tracing::warn!(
                station = %station,
                assistant_id = %assistant.id,
                "store returned an assistant that fails eligibility"
            );
            Err(AssignmentError::NoEligibleAssistant(station.to_string()))
        }
        None => Err(AssignmentError::NoEligibleAssistant(station.to_string())),
    }
}
