//! Sensor Stream Alignment onto the Canonical Time Base
//!
//! ## Overview
//!
//! The GPS, rangefinder, and barometer streams tick on independent clocks
//! at different rates. Everything downstream (trend estimation, features,
//! terrain output) joins them positionally, so they must first be
//! resampled onto the GPS timestamp sequence with bounded time-alignment
//! error. Two algorithms live here:
//!
//! - **Window-median alignment** (this file): for every GPS timestamp,
//!   collect all ranging/barometer samples within the per-log tolerance
//!   window and reduce them to a median plus quality statistics.
//! - **Nearest-neighbor alignment with gap fill** ([`nearest`]): for a
//!   sparse auxiliary stream, pick the single closest sample per target
//!   within a larger tolerance, then interpolate the gaps.
//!
//! ```text
//! GPS (canonical)   ──t₀────t₁────t₂────t₃──→
//!                      │╲    │╲    │     │
//! rangefinder       ───●─●──●─●─●──────●───→   window ±tolerance
//!                      └──median, error, amplitude per tᵢ
//! ```
//!
//! ## Windowing contract
//!
//! Ranging samples flagged invalid by their status code, or with
//! non-positive magnitude (failed readings report 0), are excluded from
//! the valid subset used for the median and amplitude — but they still
//! count as window members for the time-alignment error. An empty valid
//! subset yields a NaN median and a **zero** amplitude; the asymmetry is
//! deliberate and relied on downstream. The reference (barometer) stream
//! is never validity-filtered, but a NaN sample anywhere in a reference
//! window makes that window's median NaN rather than a biased estimate.
//!
//! All window lookups binary-search the sorted source timestamps, so a
//! full alignment is O((N+M) log M) rather than the quadratic scan the
//! naive join would cost on logs with tens of thousands of samples.

pub mod nearest;

use crate::{series::SampleSeries, stats, time::Timestamp};

/// Index-aligned outputs of the window-median aligner
///
/// Every vector has the length of the canonical GPS time base.
#[derive(Debug, Clone)]
pub struct AlignedRanging {
    /// Windowed median of valid ranging samples; NaN when none
    pub median: Vec<f64>,
    /// |nearest in-window ranging timestamp − target|, µs; NaN when the
    /// window holds no ranging sample at all
    pub time_error: Vec<f64>,
    /// Half-range `(max − min) / 2` of valid ranging samples; 0.0 when
    /// the valid subset is empty
    pub amplitude: Vec<f64>,
    /// Windowed median of the reference-altitude stream; NaN when empty
    pub reference: Vec<f64>,
}

/// Half-open index range of source samples within `target ± tolerance`
pub(crate) fn window_bounds(times: &[Timestamp], target: f64, tolerance: f64) -> (usize, usize) {
    let lo = times.partition_point(|&t| (t as f64) < target - tolerance);
    let hi = times.partition_point(|&t| (t as f64) <= target + tolerance);
    (lo, hi)
}

/// Time distance from `target` to the nearest of `times[lo..hi]`
///
/// NaN when the range is empty. The nearest member sits next to the
/// insertion point, so this is O(log n) despite arbitrary window width.
fn nearest_distance(times: &[Timestamp], lo: usize, hi: usize, target: f64) -> f64 {
    if lo == hi {
        return f64::NAN;
    }
    let ip = times.partition_point(|&t| (t as f64) < target).clamp(lo, hi);
    let mut best = f64::INFINITY;
    if ip > lo {
        best = best.min(target - times[ip - 1] as f64);
    }
    if ip < hi {
        best = best.min(times[ip] as f64 - target);
    }
    best
}

/// Resample the ranging and reference streams onto the GPS time base.
///
/// For every timestamp of `gps_times`, collects all `ranging` samples
/// within `±tolerance`, splits them into valid and excluded readings, and
/// emits the four [`AlignedRanging`] series. Empty input streams produce
/// all-NaN (and all-zero amplitude) outputs of canonical length; this
/// never fails on sparse data.
pub fn align_window_median(
    gps_times: &[Timestamp],
    ranging: &SampleSeries,
    reference: &SampleSeries,
    tolerance: f64,
) -> AlignedRanging {
    let n = gps_times.len();
    let mut out = AlignedRanging {
        median: Vec::with_capacity(n),
        time_error: Vec::with_capacity(n),
        amplitude: Vec::with_capacity(n),
        reference: Vec::with_capacity(n),
    };

    log::info!("aligning {} ranging / {} reference samples onto {} GPS timestamps (+/-{tolerance:.0} us)",
        ranging.len(), reference.len(), n);

    let mut valid = Vec::new();
    for &t in gps_times {
        let target = t as f64;

        let (lo, hi) = window_bounds(ranging.timestamps(), target, tolerance);
        out.time_error.push(nearest_distance(ranging.timestamps(), lo, hi, target));

        valid.clear();
        for i in lo..hi {
            let v = ranging.values()[i];
            // Zero readings are rangefinder failures even when status-valid.
            if ranging.is_valid(i) && v.is_finite() && v > 0.0 {
                valid.push(v);
            }
        }

        if valid.is_empty() {
            out.median.push(f64::NAN);
            out.amplitude.push(0.0);
        } else {
            out.median.push(stats::median(&valid));
            let (min, max) = valid
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            out.amplitude.push((max - min) / 2.0);
        }

        let (rlo, rhi) = window_bounds(reference.timestamps(), target, tolerance);
        out.reference.push(stats::median(&reference.values()[rlo..rhi]));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Validity;

    fn ranging(times: Vec<Timestamp>, values: Vec<f64>) -> SampleSeries {
        let validity = vec![Validity::Valid; times.len()];
        SampleSeries::with_validity(times, values, validity)
    }

    #[test]
    fn window_median_excludes_failed_readings() {
        // Scenario B: zero reading excluded by positivity, not by status
        let rfnd = ranging(vec![90_000, 95_000, 110_000], vec![5.0, 6.0, 0.0]);
        let baro = SampleSeries::new(vec![], vec![]);

        let aligned = align_window_median(&[100_000], &rfnd, &baro, 50_000.0);
        assert_eq!(aligned.median, vec![5.5]);
        assert_eq!(aligned.amplitude, vec![0.5]);
        // Nearest window member is 95_000, excluded or not
        assert_eq!(aligned.time_error, vec![5_000.0]);
        assert!(aligned.reference[0].is_nan());
    }

    #[test]
    fn status_invalid_counts_for_time_error_only() {
        let rfnd = SampleSeries::with_validity(
            vec![99_000, 140_000],
            vec![7.0, 8.0],
            vec![Validity::Invalid, Validity::Valid],
        );
        let baro = SampleSeries::new(vec![], vec![]);

        let aligned = align_window_median(&[100_000], &rfnd, &baro, 10_000.0);
        // Only the invalid sample is in-window: no median, zero amplitude,
        // but the alignment error still sees it.
        assert!(aligned.median[0].is_nan());
        assert_eq!(aligned.amplitude[0], 0.0);
        assert_eq!(aligned.time_error[0], 1_000.0);
    }

    #[test]
    fn empty_streams_give_full_length_output() {
        let empty = SampleSeries::new(vec![], vec![]);
        let aligned = align_window_median(&[0, 1000, 2000], &empty, &empty, 500.0);

        assert_eq!(aligned.median.len(), 3);
        assert!(aligned.median.iter().all(|v| v.is_nan()));
        assert!(aligned.time_error.iter().all(|v| v.is_nan()));
        assert!(aligned.amplitude.iter().all(|&v| v == 0.0));
        assert!(aligned.reference.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn reference_median_is_not_validity_filtered() {
        let rfnd = SampleSeries::new(vec![], vec![]);
        // Negative altitude is fine for the barometer stream
        let baro = SampleSeries::new(vec![99_000, 101_000], vec![-3.0, -1.0]);

        let aligned = align_window_median(&[100_000], &rfnd, &baro, 5_000.0);
        assert_eq!(aligned.reference, vec![-2.0]);
    }

    #[test]
    fn nan_reference_sample_poisons_its_window_median() {
        let rfnd = SampleSeries::new(vec![], vec![]);
        let baro =
            SampleSeries::new(vec![99_000, 100_000, 101_000], vec![1.0, 2.0, f64::NAN]);

        let aligned = align_window_median(&[100_000], &rfnd, &baro, 5_000.0);
        assert!(aligned.reference[0].is_nan());
    }

    #[test]
    fn output_order_follows_gps_base() {
        let rfnd = ranging(vec![0, 100, 200, 300], vec![1.0, 2.0, 3.0, 4.0]);
        let baro = SampleSeries::new(vec![], vec![]);

        let aligned = align_window_median(&[100, 300], &rfnd, &baro, 40.0);
        assert_eq!(aligned.median, vec![2.0, 4.0]);
    }
}
