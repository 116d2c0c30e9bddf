use crate::errors::AssignmentError;
use crate::models::BookingStatus;

/// Allowed next states for `current`. Terminal states return an empty slice.
pub fn allowed_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;

    match current {
        Searching => &[Assigned, Cancelled, Emergency],
        Assigned => &[AssistantEnRoute, Cancelled, Emergency],
        AssistantEnRoute => &[InProgress, Cancelled, Emergency],
        InProgress => &[Completed, Cancelled, Emergency],
        Completed | Cancelled | Emergency => &[],
    }
}

pub fn can_transition(current: BookingStatus, next: BookingStatus) -> bool {
    allowed_transitions(current).contains(&next)
}

/// Same as [`can_transition`] over raw status names. Names that don't parse
/// are never allowed.
pub fn can_transition_raw(current: &str, next: &str) -> bool {
    match (BookingStatus::parse(current), BookingStatus::parse(next)) {
        (Some(current), Some(next)) => can_transition(current, next),
        _ => false,
    }
}

pub fn check_transition(current: BookingStatus, next: BookingStatus) -> Result<(), AssignmentError> {
    if can_transition(current, next) {
        Ok(())
    } else {
        Err(AssignmentError::InvalidTransition {
            from: current,
            to: next,
        })
    }
}
