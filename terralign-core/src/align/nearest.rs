//! Nearest-Neighbor Alignment for Sparse Auxiliary Streams
//!
//! The terrain-height reference updates far less often than the GPS, so
//! windowed medians would mostly see empty windows. Instead each canonical
//! timestamp takes the single closest auxiliary sample — if one exists
//! within `max_gap` — and the remaining holes are filled afterwards:
//! index-linear interpolation for interior runs, constant extension at the
//! edges.
//!
//! Ties (left and right neighbor equally distant) resolve to the
//! right-hand neighbor, i.e. the insertion-point side; tests pin this
//! down because downstream joins must be reproducible.

use crate::{constants::NEAREST_MAX_GAP_US, series::SampleSeries, time::Timestamp};

/// Match each canonical timestamp to its nearest auxiliary sample.
///
/// Unmatched positions (no sample within `max_gap_us`, or an empty
/// auxiliary stream) are NaN. Output length always equals
/// `canonical.len()`. Cost is O((N+M) log M) via binary search.
pub fn align_nearest(canonical: &[Timestamp], aux: &SampleSeries, max_gap_us: f64) -> Vec<f64> {
    let times = aux.timestamps();
    let values = aux.values();
    let mut matched = 0usize;

    let out: Vec<f64> = canonical
        .iter()
        .map(|&t| {
            let target = t as f64;
            let ip = times.partition_point(|&x| (x as f64) < target);

            let left = ip.checked_sub(1).map(|i| (target - times[i] as f64, values[i]));
            let right = times.get(ip).map(|&x| (x as f64 - target, values[ip]));

            let chosen = match (left, right) {
                (Some(l), Some(r)) => {
                    // Equal distance picks the right-hand neighbor.
                    if l.0 < r.0 { Some(l) } else { Some(r) }
                }
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (None, None) => None,
            };

            match chosen {
                Some((dist, value)) if dist <= max_gap_us => {
                    matched += 1;
                    value
                }
                _ => f64::NAN,
            }
        })
        .collect();

    log::info!("nearest-neighbor alignment matched {matched}/{} targets", canonical.len());
    out
}

/// Convenience wrapper using the default terrain-reference gap tolerance.
pub fn align_nearest_default(canonical: &[Timestamp], aux: &SampleSeries) -> Vec<f64> {
    align_nearest(canonical, aux, NEAREST_MAX_GAP_US)
}

/// Fill NaN runs in place.
///
/// Interior runs are linearly interpolated by index between the bracketing
/// defined values; leading/trailing runs copy the nearest defined value.
/// A series with no defined value at all is left untouched.
pub fn fill_gaps(series: &mut [f64]) {
    let defined: Vec<usize> = (0..series.len()).filter(|&i| series[i].is_finite()).collect();
    let (Some(&first), Some(&last)) = (defined.first(), defined.last()) else {
        return;
    };

    for i in 0..first {
        series[i] = series[first];
    }
    for i in last + 1..series.len() {
        series[i] = series[last];
    }

    for pair in defined.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b > a + 1 {
            let span = (b - a) as f64;
            for i in a + 1..b {
                let frac = (i - a) as f64 / span;
                series[i] = series[a] + frac * (series[b] - series[a]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_strictly_closest_sample() {
        let aux = SampleSeries::new(vec![0, 1000, 2000], vec![10.0, 20.0, 30.0]);
        let out = align_nearest(&[100, 1400, 1900], &aux, 1_000.0);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn tie_resolves_to_right_neighbor() {
        let aux = SampleSeries::new(vec![0, 1000], vec![10.0, 20.0]);
        let out = align_nearest(&[500], &aux, 1_000.0);
        assert_eq!(out, vec![20.0]);
    }

    #[test]
    fn too_distant_neighbor_is_unmatched() {
        let aux = SampleSeries::new(vec![0], vec![10.0]);
        let out = align_nearest(&[0, 600_000], &aux, 500_000.0);
        assert_eq!(out[0], 10.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn empty_aux_stream_stays_all_nan() {
        // Scenario C: zero matched points, interpolation is a no-op
        let aux = SampleSeries::new(vec![], vec![]);
        let mut out = align_nearest(&[0, 1, 2], &aux, 500_000.0);
        assert!(out.iter().all(|v| v.is_nan()));
        fill_gaps(&mut out);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn interior_gaps_interpolate_boundaries_extend() {
        let mut series = vec![f64::NAN, 2.0, f64::NAN, f64::NAN, 8.0, f64::NAN];
        fill_gaps(&mut series);
        assert_eq!(series, vec![2.0, 2.0, 4.0, 6.0, 8.0, 8.0]);
    }
}
