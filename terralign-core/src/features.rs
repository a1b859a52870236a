//! Windowed Feature Extraction for Model Training
//!
//! Builds a per-epoch feature table from the raw ranging and barometer
//! streams: distribution statistics of each GPS-aligned window rather
//! than a single resampled value. The windowing contract is the same as
//! [`crate::align`]; the reductions differ because a learner wants
//! dispersion and reliability, not just a point estimate:
//!
//! | column          | reduction over the window                      |
//! |-----------------|------------------------------------------------|
//! | `z_median`      | median of valid ranging samples                |
//! | `z_std_dev`     | population std-dev of valid ranging samples    |
//! | `z_amplitude`   | full range `max − min` of valid samples        |
//! | `z_failure_rate`| excluded fraction; 1.0 for an empty window     |
//! | `alt_baro`      | median of the (unfiltered) barometer window    |
//!
//! Amplitude here is the full range, not the half-range the aligner
//! reports; the learner normalizes scale itself.

use crate::{
    align::window_bounds,
    constants::US_PER_MS,
    series::{SampleSeries, Table},
    stats,
    time::Timestamp,
};

/// Extract the per-epoch training feature table.
///
/// One row per canonical GPS timestamp. `TimeUS` is the raw timestamp,
/// `TimeMS` the millisecond offset from the first epoch. Feature columns
/// may contain NaN for empty windows; the caller decides whether to drop
/// such rows.
pub fn lidar_features(
    gps_times: &[Timestamp],
    ranging: &SampleSeries,
    reference: &SampleSeries,
    tolerance: f64,
) -> Table {
    let n = gps_times.len();
    let t0 = gps_times.first().copied().unwrap_or(0) as f64;

    let mut z_median = Vec::with_capacity(n);
    let mut z_std_dev = Vec::with_capacity(n);
    let mut z_amplitude = Vec::with_capacity(n);
    let mut z_failure_rate = Vec::with_capacity(n);
    let mut alt_baro = Vec::with_capacity(n);

    let mut valid = Vec::new();
    for &t in gps_times {
        let target = t as f64;

        let (lo, hi) = window_bounds(ranging.timestamps(), target, tolerance);
        let total = hi - lo;
        valid.clear();
        for i in lo..hi {
            let v = ranging.values()[i];
            if ranging.is_valid(i) && v.is_finite() && v > 0.0 {
                valid.push(v);
            }
        }

        if valid.is_empty() {
            z_median.push(f64::NAN);
            z_std_dev.push(f64::NAN);
            z_amplitude.push(f64::NAN);
        } else {
            z_median.push(stats::median(&valid));
            z_std_dev.push(stats::mean_std(&valid).1);
            let (min, max) = valid
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            z_amplitude.push(max - min);
        }

        // An epoch the rangefinder never reported into counts as fully failed.
        z_failure_rate.push(if total == 0 {
            1.0
        } else {
            (total - valid.len()) as f64 / total as f64
        });

        let (rlo, rhi) = window_bounds(reference.timestamps(), target, tolerance);
        alt_baro.push(stats::median(&reference.values()[rlo..rhi]));
    }

    log::info!("extracted {n} feature rows");

    Table::new()
        .with_column("TimeUS", gps_times.iter().map(|&t| t as f64).collect())
        .with_column("TimeMS", gps_times.iter().map(|&t| (t as f64 - t0) / US_PER_MS).collect())
        .with_column("z_median", z_median)
        .with_column("z_std_dev", z_std_dev)
        .with_column("z_amplitude", z_amplitude)
        .with_column("z_failure_rate", z_failure_rate)
        .with_column("alt_baro", alt_baro)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Validity;

    #[test]
    fn window_statistics_per_epoch() {
        let rfnd = SampleSeries::with_validity(
            vec![95_000, 100_000, 105_000],
            vec![4.0, 6.0, 0.0],
            vec![Validity::Valid, Validity::Valid, Validity::Valid],
        );
        let baro = SampleSeries::new(vec![100_000], vec![50.0]);

        let table = lidar_features(&[100_000], &rfnd, &baro, 10_000.0);
        assert_eq!(table.column("z_median").unwrap(), &[5.0]);
        assert_eq!(table.column("z_std_dev").unwrap(), &[1.0]);
        // Full range, not halved
        assert_eq!(table.column("z_amplitude").unwrap(), &[2.0]);
        // 3 in-window, 1 excluded (zero reading)
        assert!((table.column("z_failure_rate").unwrap()[0] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(table.column("alt_baro").unwrap(), &[50.0]);
    }

    #[test]
    fn empty_window_is_total_failure() {
        let rfnd = SampleSeries::new(vec![], vec![]);
        let baro = SampleSeries::new(vec![], vec![]);

        let table = lidar_features(&[0, 1_000_000], &rfnd, &baro, 50_000.0);
        assert_eq!(table.column("z_failure_rate").unwrap(), &[1.0, 1.0]);
        assert!(table.column("z_median").unwrap().iter().all(|v| v.is_nan()));
        assert!(table.column("z_amplitude").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn time_columns_anchor_to_first_epoch() {
        let rfnd = SampleSeries::new(vec![], vec![]);
        let baro = SampleSeries::new(vec![], vec![]);

        let table = lidar_features(&[5_000_000, 5_250_000, 6_000_000], &rfnd, &baro, 1000.0);
        assert_eq!(table.column("TimeUS").unwrap(), &[5_000_000.0, 5_250_000.0, 6_000_000.0]);
        assert_eq!(table.column("TimeMS").unwrap(), &[0.0, 250.0, 1000.0]);
    }

    #[test]
    fn status_invalid_samples_raise_failure_rate() {
        let rfnd = SampleSeries::with_validity(
            vec![99_000, 100_000],
            vec![5.0, 5.0],
            vec![Validity::Invalid, Validity::Valid],
        );
        let baro = SampleSeries::new(vec![], vec![]);

        let table = lidar_features(&[100_000], &rfnd, &baro, 5_000.0);
        assert_eq!(table.column("z_failure_rate").unwrap(), &[0.5]);
        assert_eq!(table.column("z_median").unwrap(), &[5.0]);
        assert_eq!(table.column("z_std_dev").unwrap(), &[0.0]);
    }
}
