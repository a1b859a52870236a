//! Constants for the Alignment and Trend-Estimation Core
//!
//! All tunable numeric values are defined here with their rationale.
//! Defaults mirror the behavior validated against recorded survey flights;
//! callers override them through the config structs, not by editing code.

/// Percentile of halved GPS inter-sample intervals used as the alignment
/// tolerance.
///
/// A high percentile covers the typical spacing while staying robust to a
/// handful of abnormally large gaps (GPS dropouts). The mean would be
/// dragged up by dropouts; the max would be defined by them.
pub const THRESHOLD_PERCENTILE: f64 = 95.0;

/// Ranging status code that marks a good reading (ArduPilot RFND `Stat`).
pub const RANGING_STATUS_GOOD: f64 = 4.0;

/// Maximum allowed time distance for nearest-neighbor matching of sparse
/// auxiliary streams (terrain reference), in microseconds.
///
/// The terrain reference updates at a few Hz at best, so this is
/// deliberately much larger than the window-median tolerance.
pub const NEAREST_MAX_GAP_US: f64 = 500_000.0;

/// Minimum horizontal separation between accepted extrema, in samples.
///
/// Prevents over-segmentation from sensor noise spikes: two ground
/// contacts closer than this are one contact as far as the fit cares.
pub const PEAK_MIN_DISTANCE: usize = 80;

/// Window length of the centered rolling median used to reject spurious
/// extrema, in points.
pub const ROLLING_MEDIAN_WINDOW: usize = 11;

/// Maximum absolute deviation from the local rolling median before an
/// extremum is rejected, in signal units (meters).
pub const ROLLING_MEDIAN_TOLERANCE: f64 = 5.0;

/// Default degree of the ground-trend polynomial.
pub const DEFAULT_POLY_DEGREE: usize = 8;

/// Default |z-score| threshold for the outlier filter.
pub const ZSCORE_THRESHOLD: f64 = 2.0;

/// Microseconds per millisecond, for TimeUS -> TimeMS columns.
pub const US_PER_MS: f64 = 1000.0;
