//! Time Base Handling and Alignment Tolerance
//!
//! Flight-controller logs stamp every record in microseconds since boot.
//! The GPS stream is the canonical time base: the alignment tolerance that
//! decides which samples "belong" to a GPS timestamp is derived once per
//! log from the GPS sampling cadence and shared by every window-based
//! alignment in that run.
//!
//! ## Why the 95th percentile of half-intervals?
//!
//! Half of the typical inter-sample spacing is the natural window radius:
//! adjacent windows then tile the time axis without overlap. Taking a high
//! percentile instead of the mean keeps a handful of abnormally large gaps
//! (GPS dropouts) from inflating the tolerance, while taking less than the
//! max keeps a single dropout from defining it.

use crate::{
    constants::THRESHOLD_PERCENTILE,
    errors::{ProcessingError, ProcessingResult},
};

/// Timestamp in microseconds since device boot
pub type Timestamp = u64;

/// Compute the per-log alignment tolerance from the canonical (GPS)
/// timestamp sequence.
///
/// Returns the 95th percentile of halved consecutive timestamp
/// differences, in microseconds. At least two timestamps are required;
/// fewer is an [`ProcessingError::InsufficientData`] error rather than a
/// silent default.
pub fn temporal_threshold(timestamps: &[Timestamp]) -> ProcessingResult<f64> {
    if timestamps.len() < 2 {
        return Err(ProcessingError::InsufficientData {
            required: 2,
            available: timestamps.len(),
        });
    }

    let half_intervals: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 / 2.0)
        .collect();

    let threshold = percentile(&half_intervals, THRESHOLD_PERCENTILE);
    log::debug!("alignment tolerance: +/-{threshold:.0} us over {} intervals", half_intervals.len());
    Ok(threshold)
}

/// Linearly interpolated percentile, `q` in `[0, 100]`
///
/// Same convention as numpy's default: rank `q/100 * (n-1)` interpolated
/// between the two nearest order statistics. `values` must be non-empty.
pub(crate) fn percentile(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
