//! Statistical Outlier Filtering
//!
//! Post-alignment signals still carry spurious samples (multi-path
//! returns, transient pressure spikes). The z-score filter rejects them
//! against the whole-flight distribution: batch processing sees the full
//! signal, so a global score is both cheap and stable. Rejected samples
//! become NaN so downstream row filtering treats them uniformly with
//! alignment gaps.

use crate::stats;

/// Result of an outlier filtering pass
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Filtered signal, rejected positions replaced with NaN
    pub values: Vec<f64>,
    /// Number of samples rejected
    pub rejected: usize,
}

/// Reject samples whose z-score magnitude exceeds `threshold`.
///
/// NaN inputs are substituted with 0.0 for scoring only: an undefined
/// sample far from the signal's mean is itself scored and usually
/// rejected, but the substitute never enters the output — an
/// un-rejected NaN position stays NaN. A constant signal (zero standard
/// deviation) rejects nothing.
pub fn filter_outliers_zscore(data: &[f64], threshold: f64) -> FilterOutcome {
    let substituted: Vec<f64> =
        data.iter().map(|&v| if v.is_finite() { v } else { 0.0 }).collect();
    let (mean, std) = stats::mean_std(&substituted);

    if std == 0.0 || data.is_empty() {
        return FilterOutcome { values: data.to_vec(), rejected: 0 };
    }

    let mut rejected = 0usize;
    let values: Vec<f64> = data
        .iter()
        .zip(&substituted)
        .map(|(&original, &scored)| {
            if ((scored - mean) / std).abs() > threshold {
                rejected += 1;
                f64::NAN
            } else {
                original
            }
        })
        .collect();

    if rejected > 0 {
        log::info!("z-score filter rejected {rejected} of {} samples", data.len());
    }
    FilterOutcome { values, rejected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ZSCORE_THRESHOLD;

    #[test]
    fn rejects_gross_outlier() {
        // 100 samples near 10.0 with one wild spike
        let mut data: Vec<f64> = (0..100).map(|i| 10.0 + (i % 5) as f64 * 0.01).collect();
        data[42] = 500.0;

        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert_eq!(out.rejected, 1);
        assert!(out.values[42].is_nan());
        assert!(out.values[41].is_finite());
    }

    #[test]
    fn constant_signal_passes_untouched() {
        let data = vec![7.5; 50];
        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert_eq!(out.rejected, 0);
        assert_eq!(out.values, data);
    }

    #[test]
    fn nan_scored_at_zero_is_rejected_off_mean() {
        // Signal near 100: a NaN scored as 0.0 is far off-mean
        let mut data = vec![100.0; 60];
        data[10] = f64::NAN;

        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert!(out.values[10].is_nan());
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn unrejected_nan_stays_nan() {
        // Zero-mean signal: the NaN's 0.0 score is unremarkable, so it
        // survives scoring. The gap must come back as a gap, not 0.0.
        let mut data: Vec<f64> =
            (0..50).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        data[10] = f64::NAN;

        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert!(out.values[10].is_nan());
        assert_eq!(out.rejected, 0);
        assert_eq!(out.values.iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn single_spike_in_constant_signal() {
        let mut data = vec![10.0; 50];
        data[25] = 1000.0;

        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert_eq!(out.rejected, 1);
        assert!(out.values[25].is_nan());
        assert!(out.values.iter().enumerate().all(|(i, &v)| i == 25 || v == 10.0));
    }

    #[test]
    fn idempotent_on_clean_data() {
        let data: Vec<f64> = (0..40).map(|i| 5.0 + (i % 7) as f64 * 0.1).collect();
        let once = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert_eq!(once.rejected, 0);
        let twice = filter_outliers_zscore(&once.values, ZSCORE_THRESHOLD);
        assert_eq!(twice.values, once.values);
    }

    #[test]
    fn inliers_survive_unchanged() {
        let data = vec![1.0, 1.1, 0.9, 1.05, 0.95, 1.0, 1.02];
        let out = filter_outliers_zscore(&data, ZSCORE_THRESHOLD);
        assert_eq!(out.rejected, 0);
        assert_eq!(out.values, data);
    }
}
