//! Extrema Detection and Automatic Outlier Rejection
//!
//! Candidate ground-contact points are the local extrema of the aligned
//! ranging signal: minima of altitude-minus-range for the normalization
//! path, maxima of raw range for the lidar-ground variant. Detection runs
//! on the NaN-compacted signal, enforces a minimum horizontal separation
//! (noise spikes otherwise over-segment the signal), and is followed by a
//! rolling-median pass that drops isolated spurious extrema without
//! needing any global threshold.

use crate::stats;

/// Which extrema of the signal are ground-contact candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremaMode {
    /// Local minima (altitude-minus-range signals)
    Minima,
    /// Local maxima (raw range distance signals)
    Maxima,
}

/// A candidate ground-contact point
///
/// Carries its own abscissa so pruning never has to reason about
/// positions in some earlier array — the timestamp is the stable
/// identity of the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    /// Time-base value at the extremum (microseconds)
    pub time: f64,
    /// Signal value at the extremum
    pub value: f64,
}

/// Detect local extrema with a minimum horizontal separation.
///
/// Positions where the signal (or the time base) is NaN are skipped
/// before neighbor comparison, mirroring detection on the compacted
/// signal. A run of equal values strictly above both neighbors counts
/// as one extremum at the run's midpoint; quantized rangefinder output
/// makes flat dips common. When two extrema sit closer than
/// `min_distance` compacted samples, the one with the better (higher,
/// in detection orientation) value wins.
pub fn find_extrema(
    times: &[f64],
    signal: &[f64],
    mode: ExtremaMode,
    min_distance: usize,
) -> Vec<Extremum> {
    debug_assert_eq!(times.len(), signal.len());

    // Compact: detection neighbors are the defined samples, not raw indices.
    let mut ct: Vec<f64> = Vec::new();
    let mut cv: Vec<f64> = Vec::new();
    for (&t, &v) in times.iter().zip(signal) {
        if t.is_finite() && v.is_finite() {
            ct.push(t);
            cv.push(match mode {
                ExtremaMode::Maxima => v,
                ExtremaMode::Minima => -v,
            });
        }
    }

    if cv.len() < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = Vec::new();
    let mut i = 1;
    while i + 1 < cv.len() {
        if cv[i] > cv[i - 1] {
            // Rising edge: walk the (possibly single-sample) plateau.
            let start = i;
            let mut end = i;
            while end + 1 < cv.len() && cv[end + 1] == cv[end] {
                end += 1;
            }
            if end + 1 < cv.len() && cv[end + 1] < cv[end] {
                candidates.push((start + end) / 2);
            }
            i = end + 1;
        } else {
            i += 1;
        }
    }

    // Distance constraint: best peaks claim their neighborhood first.
    candidates.sort_by(|&i, &j| cv[j].total_cmp(&cv[i]));
    let mut kept: Vec<usize> = Vec::new();
    for &i in &candidates {
        if kept.iter().all(|&j| i.abs_diff(j) >= min_distance) {
            kept.push(i);
        }
    }
    kept.sort_unstable();

    kept.into_iter()
        .map(|i| Extremum {
            time: ct[i],
            value: match mode {
                ExtremaMode::Maxima => cv[i],
                ExtremaMode::Minima => -cv[i],
            },
        })
        .collect()
}

/// Drop extrema that stray from their local rolling median.
///
/// A centered rolling median (edge-tolerant, minimum one point) runs over
/// the extrema values; points whose absolute deviation from it reaches
/// `tolerance` are rejected. Returns the surviving points and the
/// rejected count.
pub fn reject_rolling_outliers(
    points: &[Extremum],
    window: usize,
    tolerance: f64,
) -> (Vec<Extremum>, usize) {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let half = window / 2;

    let inliers: Vec<Extremum> = points
        .iter()
        .enumerate()
        .filter(|&(i, p)| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            (p.value - stats::median(&values[lo..hi])).abs() < tolerance
        })
        .map(|(_, &p)| p)
        .collect();

    let rejected = points.len() - inliers.len();
    if rejected > 0 {
        log::info!("rolling-median filter removed {rejected} of {} extrema", points.len());
    }
    (inliers, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx_times(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn finds_simple_minima() {
        let signal = vec![3.0, 1.0, 3.0, 4.0, 0.5, 4.0, 5.0];
        let points = find_extrema(&idx_times(7), &signal, ExtremaMode::Minima, 1);
        let times: Vec<f64> = points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![1.0, 4.0]);
        assert_eq!(points[1].value, 0.5);
    }

    #[test]
    fn distance_constraint_keeps_better_extremum() {
        // Two minima 2 apart; with min_distance 5 only the deeper survives
        let signal = vec![5.0, 1.0, 4.0, 0.5, 5.0, 5.0, 5.0];
        let points = find_extrema(&idx_times(7), &signal, ExtremaMode::Minima, 5);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 0.5);
    }

    #[test]
    fn maxima_mode_inverts_orientation() {
        let signal = vec![0.0, 5.0, 0.0, 7.0, 0.0];
        let points = find_extrema(&idx_times(5), &signal, ExtremaMode::Maxima, 1);
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![5.0, 7.0]);
    }

    #[test]
    fn plateau_extremum_collapses_to_midpoint() {
        // A quantized flat dip is one minimum, placed mid-plateau
        let signal = vec![5.0, 3.0, 3.0, 3.0, 5.0, 6.0, 7.0];
        let points = find_extrema(&idx_times(7), &signal, ExtremaMode::Minima, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time, 2.0);
        assert_eq!(points[0].value, 3.0);
    }

    #[test]
    fn plateau_running_to_the_edge_is_not_an_extremum() {
        let signal = vec![1.0, 4.0, 4.0, 4.0];
        let points = find_extrema(&idx_times(4), &signal, ExtremaMode::Maxima, 1);
        assert!(points.is_empty());
    }

    #[test]
    fn nan_positions_are_compacted_away() {
        let times = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let signal = vec![3.0, f64::NAN, 1.0, f64::NAN, 3.0, 4.0];
        // After compaction [3, 1, 3, 4] the middle sample is a minimum
        let points = find_extrema(&times, &signal, ExtremaMode::Minima, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time, 2.0);
    }

    #[test]
    fn rolling_filter_drops_isolated_spike() {
        let mut points: Vec<Extremum> =
            (0..20).map(|i| Extremum { time: i as f64, value: 10.0 }).collect();
        points[9].value = 40.0;

        let (inliers, rejected) = reject_rolling_outliers(&points, 11, 5.0);
        assert_eq!(rejected, 1);
        assert_eq!(inliers.len(), 19);
        assert!(inliers.iter().all(|p| p.value == 10.0));
    }

    #[test]
    fn rolling_filter_tolerates_slow_drift() {
        // A ramp is fine: every point stays near its local median
        let points: Vec<Extremum> =
            (0..50).map(|i| Extremum { time: i as f64, value: i as f64 * 0.5 }).collect();
        let (inliers, rejected) = reject_rolling_outliers(&points, 11, 5.0);
        assert_eq!(rejected, 0);
        assert_eq!(inliers.len(), 50);
    }
}
