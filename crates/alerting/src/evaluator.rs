//! Window/threshold evaluation

/// Whether the retained (post-prune) failure count reaches the threshold.
///
/// Non-positive thresholds always cross.
pub fn threshold_crossed(retained: usize, failure_threshold: i64) -> bool {
    if failure_threshold <= 0 {
        return true;
    }
    i64::try_from(retained).map_or(true, |count| count >= failure_threshold)
}
