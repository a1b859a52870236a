//! Flight Processing Pipeline
//!
//! ## Overview
//!
//! End-to-end orchestration of one flight log: fetch raw sensor tables
//! from the repository, derive the per-log alignment tolerance, resample
//! every stream onto the GPS time base, estimate and subtract the ground
//! trend, filter outliers, and persist the aligned table. The numeric
//! stages all live in sibling modules; this module only decides the
//! order, the column names, and which sensors are optional.
//!
//! ```text
//! repository ──GPS/RFND/BARO──→ tolerance ──→ window-median alignment
//!      │                                              │
//!      └──TERR (optional)──→ nearest + gap fill       │
//!                                      │              ▼
//!                                      │      trend estimation ──→ normalize
//!                                      │              │
//!                                      └──────────────┴──→ z-score filter
//!                                                           │
//!                              drop incomplete rows ←───────┘
//!                                      │
//!                              save "aligned_data"
//! ```
//!
//! ## Aligned table columns
//!
//! | column           | meaning                                           |
//! |------------------|---------------------------------------------------|
//! | `TimeUS`         | canonical GPS timestamp, µs                       |
//! | `TimeMS`         | millisecond offset from the first epoch           |
//! | `alt_gps`        | GPS altitude                                      |
//! | `dist_median`    | windowed median rangefinder distance              |
//! | `dist_amplitude` | half-range of the valid window                    |
//! | `time_error`     | alignment error to the nearest ranging sample, µs |
//! | `alt_baro`       | windowed median barometric altitude               |
//! | `z_gps`          | `alt_gps − dist_median`, raw terrain estimate     |
//! | `trend`          | fitted ground trend of `z_gps`                    |
//! | `alt_norm`       | `alt_gps − trend`, trend-corrected altitude       |
//! | `alt_relative`   | normalized terrain re-anchored to takeoff altitude|
//! | `terr_alt`       | `alt_norm − alt_baro`, baro-referenced terrain    |
//! | `z_baro`         | outlier-filtered `alt_baro − dist_median`         |
//! | `alt_terrain`    | terrain-reference height (only when TERR exists)  |

use crate::{
    align::{align_window_median, nearest::align_nearest_default, nearest::fill_gaps},
    constants::{RANGING_STATUS_GOOD, US_PER_MS, ZSCORE_THRESHOLD},
    errors::{ProcessingResult, StoreError},
    features::lidar_features,
    filters::filter_outliers_zscore,
    operator::Operator,
    repository::LogRepository,
    series::{SampleSeries, Table},
    time::temporal_threshold,
    trend::{estimate_trend, TrendConfig},
};

/// Repository key of the aligned per-flight table
pub const ALIGNED_TABLE: &str = "aligned_data";
/// Repository key of the training-feature table
pub const FEATURES_TABLE: &str = "ml_features";

/// Per-run options for [`process_flight`]
#[derive(Debug, Clone)]
pub struct FlightOptions {
    /// Subtract the fitted ground trend; off yields a zero trend column
    pub apply_correction: bool,
    /// Initial polynomial degree of the trend fit
    pub degree: usize,
}

impl Default for FlightOptions {
    fn default() -> Self {
        Self { apply_correction: true, degree: crate::constants::DEFAULT_POLY_DEGREE }
    }
}

impl FlightOptions {
    /// Disable trend correction
    pub fn without_correction(mut self) -> Self {
        self.apply_correction = false;
        self
    }

    /// Override the initial trend degree
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }
}

/// Run the full alignment and trend-correction pipeline for one log.
///
/// GPS, rangefinder, and barometer data are required; the terrain
/// reference is joined when present and silently skipped when the log
/// has none. With an operator the trend fit is interactively refined.
/// Rows still containing NaN after every stage are dropped before the
/// table is saved under [`ALIGNED_TABLE`] and returned.
pub fn process_flight(
    repo: &mut dyn LogRepository,
    operator: Option<&mut dyn Operator>,
    options: &FlightOptions,
) -> ProcessingResult<Table> {
    let raw = repo.raw_sensor_data(&["GPS", "RFND", "BARO"])?;
    let gps = SampleSeries::from_table(&raw["GPS"], "GPS", "TimeUS", "Alt", None)?;
    let rfnd = SampleSeries::from_table(
        &raw["RFND"],
        "RFND",
        "TimeUS",
        "Dist1",
        Some(("Stat1", RANGING_STATUS_GOOD)),
    )?;
    let baro = SampleSeries::from_table(&raw["BARO"], "BARO", "TimeUS", "Alt", None)?;

    let tolerance = temporal_threshold(gps.timestamps())?;
    let aligned = align_window_median(gps.timestamps(), &rfnd, &baro, tolerance);

    let times_f64: Vec<f64> = gps.timestamps().iter().map(|&t| t as f64).collect();
    let alt_gps = gps.values();

    // Raw terrain estimate: what the rangefinder says the ground is at.
    let z_gps: Vec<f64> =
        alt_gps.iter().zip(&aligned.median).map(|(&a, &d)| a - d).collect();

    let trend = if options.apply_correction {
        let config = TrendConfig::default().with_degree(options.degree);
        estimate_trend(&times_f64, &z_gps, &config, operator)?.trend
    } else {
        log::info!("trend correction disabled, keeping raw altitudes");
        vec![0.0; z_gps.len()]
    };

    let alt_norm: Vec<f64> = alt_gps.iter().zip(&trend).map(|(&a, &t)| a - t).collect();

    // Re-anchor the corrected terrain estimate to the takeoff altitude so
    // the column stays comparable across flights.
    let first_alt = alt_gps.first().copied().unwrap_or(0.0);
    let alt_relative: Vec<f64> =
        z_gps.iter().zip(&trend).map(|(&z, &t)| z - t + first_alt).collect();

    // Terrain altitude as seen against the barometric reference.
    let terr_alt: Vec<f64> =
        alt_norm.iter().zip(&aligned.reference).map(|(&a, &b)| a - b).collect();

    let z_baro_raw: Vec<f64> = aligned
        .reference
        .iter()
        .zip(&aligned.median)
        .map(|(&b, &d)| b - d)
        .collect();
    let z_baro = filter_outliers_zscore(&z_baro_raw, ZSCORE_THRESHOLD).values;

    let t0 = times_f64.first().copied().unwrap_or(0.0);
    let mut table = Table::new()
        .with_column("TimeUS", times_f64.clone())
        .with_column("TimeMS", times_f64.iter().map(|&t| (t - t0) / US_PER_MS).collect())
        .with_column("alt_gps", alt_gps.to_vec())
        .with_column("dist_median", aligned.median)
        .with_column("dist_amplitude", aligned.amplitude)
        .with_column("time_error", aligned.time_error)
        .with_column("alt_baro", aligned.reference)
        .with_column("z_gps", z_gps)
        .with_column("trend", trend)
        .with_column("alt_norm", alt_norm)
        .with_column("alt_relative", alt_relative)
        .with_column("terr_alt", terr_alt)
        .with_column("z_baro", z_baro);

    // The terrain reference is an optional sensor: absent on most
    // airframes, joined as an extra column when the log has it.
    match repo.raw_sensor_data(&["TERR"]) {
        Ok(terr_raw) => {
            let terr =
                SampleSeries::from_table(&terr_raw["TERR"], "TERR", "TimeUS", "CHeight", None)?;
            let mut heights = align_nearest_default(gps.timestamps(), &terr);
            fill_gaps(&mut heights);
            table.insert("alt_terrain", heights);
        }
        Err(StoreError::MissingData { sensor }) => {
            log::debug!("no {sensor} data in this log, skipping terrain reference");
        }
        Err(e) => return Err(e.into()),
    }

    let clean = table.drop_nan_rows();
    log::info!(
        "aligned table: {} of {} rows complete",
        clean.len(),
        gps.timestamps().len()
    );
    repo.save_processed(&clean, ALIGNED_TABLE)?;
    Ok(clean)
}

/// Build and persist the training-feature table for one log.
///
/// Windowed distribution statistics of the rangefinder and barometer
/// streams over the GPS time base, saved under [`FEATURES_TABLE`]. Rows
/// with empty windows are kept; their failure rate of 1.0 is itself a
/// feature.
pub fn extract_features(repo: &mut dyn LogRepository) -> ProcessingResult<Table> {
    let raw = repo.raw_sensor_data(&["GPS", "RFND", "BARO"])?;
    let gps = SampleSeries::from_table(&raw["GPS"], "GPS", "TimeUS", "Alt", None)?;
    let rfnd = SampleSeries::from_table(
        &raw["RFND"],
        "RFND",
        "TimeUS",
        "Dist1",
        Some(("Stat1", RANGING_STATUS_GOOD)),
    )?;
    let baro = SampleSeries::from_table(&raw["BARO"], "BARO", "TimeUS", "Alt", None)?;

    let tolerance = temporal_threshold(gps.timestamps())?;
    let table = lidar_features(gps.timestamps(), &rfnd, &baro, tolerance);

    repo.save_processed(&table, FEATURES_TABLE)?;
    Ok(table)
}
