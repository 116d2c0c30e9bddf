use crate::models::{ApplicationStatus, Assistant};

/// Whether `assistant` may take a new booking at `station`.
pub fn is_eligible(assistant: &Assistant, station: &str) -> bool {
    assistant.verified
        && assistant.application_status == ApplicationStatus::Approved
        && assistant.eligible
        && !assistant.revoked
        && assistant.works_at(station)
}

/// Picks the eligible candidate with the lowest id, so the same inputs always
/// yield the same assistant.
pub fn select_eligible(candidates: Vec<Assistant>, station: &str) -> Option<Assistant> {
    candidates
        .into_iter()
        .filter(|a| is_eligible(a, station))
        .min_by(|a, b| a.id.cmp(&b.id))
}
