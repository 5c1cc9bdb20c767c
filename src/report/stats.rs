//! Summary arithmetic over call outcomes.
//!
//! Pure helpers the report generator builds its statistics and
//! recommendation blocks from.

use std::collections::BTreeSet;

use crate::models::CallOutcome;

/// Confidence at or above which a result counts as high-confidence.
pub const HIGH_CONFIDENCE_MIN: f64 = 8.0;

/// Confidence at or above which a result counts as medium-confidence;
/// the band is right-open at [`HIGH_CONFIDENCE_MIN`].
pub const MEDIUM_CONFIDENCE_MIN: f64 = 6.0;

/// Elapsed seconds under which a call counts as a fast response.
pub const FAST_RESPONSE_SECS: f64 = 2.0;

/// The successful outcomes, in input order.
pub fn successes(outcomes: &[CallOutcome]) -> Vec<&CallOutcome> {
    outcomes.iter().filter(|o| o.is_success()).collect()
}

/// The failed outcomes, in input order.
pub fn failures(outcomes: &[CallOutcome]) -> Vec<&CallOutcome> {
    outcomes.iter().filter(|o| !o.is_success()).collect()
}

/// Success rate as a percentage; zero when nothing was attempted.
pub fn success_rate(attempted: usize, succeeded: usize) -> f64 {
    if attempted == 0 {
        return 0.0;
    }
    (succeeded as f64 / attempted as f64) * 100.0
}

/// Mean confidence over the given outcomes; zero for an empty slice.
pub fn average_confidence(outcomes: &[&CallOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().map(|o| o.confidence).sum::<f64>() / outcomes.len() as f64
}

/// Mean elapsed seconds over the given outcomes; zero for an empty slice.
pub fn average_elapsed(outcomes: &[&CallOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    outcomes.iter().map(|o| o.elapsed_seconds).sum::<f64>() / outcomes.len() as f64
}

/// Number of distinct service ids among the given outcomes.
pub fn distinct_services(outcomes: &[&CallOutcome]) -> usize {
    outcomes
        .iter()
        .map(|o| o.service.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Outcomes with confidence at or above the high-confidence floor.
pub fn high_confidence_count(outcomes: &[&CallOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| o.confidence >= HIGH_CONFIDENCE_MIN)
        .count()
}

/// Outcomes in the medium-confidence band.
pub fn medium_confidence_count(outcomes: &[&CallOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| o.confidence >= MEDIUM_CONFIDENCE_MIN && o.confidence < HIGH_CONFIDENCE_MIN)
        .count()
}

/// Outcomes that finished under the fast-response bound.
pub fn fast_responder_count(outcomes: &[&CallOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| o.elapsed_seconds < FAST_RESPONSE_SECS)
        .count()
}
