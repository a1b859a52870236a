//! Ground-Trend Estimation
//!
//! ## Overview
//!
//! The aligned ranging signal mixes two things: the drone's altitude
//! changes and the terrain relief underneath. This module separates them.
//! Candidate "ground contact" extrema are detected in the noisy signal,
//! statistically implausible ones are rejected, an operator may prune
//! further, and a bounded-degree polynomial through the survivors becomes
//! the terrain trend. Subtracting it yields the drone-relative signal:
//!
//! ```text
//! signal ──→ extrema ──→ rolling-median ──→ (operator) ──→ polyfit ──→ trend
//!    │          (80-sample spacing)          refinement                  │
//!    └────────────────────────── minus ────────────────────────────────→ normalized
//! ```
//!
//! ## Interactive refinement
//!
//! Refinement is an explicit state machine over an injected
//! [`Operator`](crate::operator::Operator) channel:
//!
//! - **DegreeTuning** — fit, render, ask whether the degree is
//!   acceptable; on "n" read a new integer degree and re-fit. Non-numeric
//!   input re-prompts, it never aborts the session.
//! - **PointPruning** — fit, render the indexed point list, read a
//!   comma-separated list of display indices to discard. Out-of-range or
//!   non-numeric entries are reported and skipped. Ends on empty input or
//!   when the surviving count can no longer support the degree.
//! - **FinalFit** — fit whatever survived and evaluate over the full time
//!   base.
//!
//! Both loops render the current fit *before* prompting, and termination
//! is bounded: accept, empty input, or point exhaustion.
//!
//! ## Fallback contract
//!
//! With no more surviving points than the degree (or a singular system),
//! fitting is infeasible. The trend is then all-zero — "no correction
//! available" — and the run continues with a diagnostic; this is a
//! documented soft condition, not an error. The lidar-ground variant
//! ([`ground_trend_from_ranging`]) instead reports the infeasible fit as
//! an all-NaN trend, because its consumers compare terrain sources and
//! must be able to tell "flat correction" from "no estimate".

pub mod extrema;
pub mod polyfit;

pub use extrema::{find_extrema, reject_rolling_outliers, ExtremaMode, Extremum};
pub use polyfit::{polyfit, Polynomial};

use std::collections::BTreeSet;

use crate::{
    align::nearest::fill_gaps,
    constants::{
        DEFAULT_POLY_DEGREE, PEAK_MIN_DISTANCE, ROLLING_MEDIAN_TOLERANCE, ROLLING_MEDIAN_WINDOW,
    },
    errors::ProcessingResult,
    operator::{FitView, Operator},
};

/// Tuning knobs for the ground-trend estimator
#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Polynomial degree of the trend fit
    pub degree: usize,
    /// Which extrema are ground-contact candidates
    pub mode: ExtremaMode,
    /// Minimum horizontal separation between extrema, in samples
    pub peak_distance: usize,
    /// Rolling-median window for automatic outlier rejection, in points
    pub rolling_window: usize,
    /// Absolute-deviation tolerance of the rolling-median filter
    pub rolling_tolerance: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_POLY_DEGREE,
            mode: ExtremaMode::Minima,
            peak_distance: PEAK_MIN_DISTANCE,
            rolling_window: ROLLING_MEDIAN_WINDOW,
            rolling_tolerance: ROLLING_MEDIAN_TOLERANCE,
        }
    }
}

impl TrendConfig {
    /// Override the polynomial degree
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Override the extrema orientation
    pub fn with_mode(mut self, mode: ExtremaMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the minimum extrema separation
    pub fn with_peak_distance(mut self, samples: usize) -> Self {
        self.peak_distance = samples;
        self
    }
}

/// Result of a trend estimation run
#[derive(Debug, Clone)]
pub struct TrendOutcome {
    /// `signal − trend`, index-aligned with the input
    pub normalized: Vec<f64>,
    /// Fitted trend over the time base; all-zero when the fit fell back
    pub trend: Vec<f64>,
    /// Degree actually used (the operator may have changed it)
    pub degree: usize,
    /// Ground-contact points that survived filtering and pruning
    pub surviving_points: usize,
}

/// Separate a signal into ground trend and normalized remainder.
///
/// `times` and `signal` are index-aligned; NaN positions in either are
/// excluded from detection and keep a NaN trend value. With an operator
/// the interactive state machine runs; without one the automatically
/// filtered extrema are fitted directly.
pub fn estimate_trend(
    times: &[f64],
    signal: &[f64],
    config: &TrendConfig,
    operator: Option<&mut dyn Operator>,
) -> ProcessingResult<TrendOutcome> {
    assert_eq!(times.len(), signal.len(), "time base/signal length mismatch");

    if !signal.iter().any(|v| v.is_finite()) {
        log::warn!("trend estimation: signal is empty or all-NaN, returning zero trend");
        return Ok(TrendOutcome {
            normalized: signal.to_vec(),
            trend: vec![0.0; signal.len()],
            degree: config.degree,
            surviving_points: 0,
        });
    }

    let detected = find_extrema(times, signal, config.mode, config.peak_distance);
    let (mut points, _) =
        reject_rolling_outliers(&detected, config.rolling_window, config.rolling_tolerance);
    log::info!("{} ground-contact candidates after automatic filtering", points.len());

    let mut degree = config.degree;
    if let Some(op) = operator {
        degree = tune_degree(op, times, signal, &points, degree)?;
        points = prune_points(op, times, signal, points, degree)?;
    }

    let trend = match fit_points(&points, degree) {
        Some(poly) => eval_trend(&poly, times),
        None => {
            log::warn!(
                "{} surviving points cannot support a degree {degree} fit; using zero trend",
                points.len()
            );
            vec![0.0; signal.len()]
        }
    };

    let normalized = signal.iter().zip(&trend).map(|(&s, &t)| s - t).collect();
    Ok(TrendOutcome { normalized, trend, degree, surviving_points: points.len() })
}

/// Terrain trend straight from the ranging distance signal.
///
/// Maxima of downward range are ground returns under vegetation gaps.
/// Non-interactive; the resulting trend is gap-filled (interior
/// interpolation, boundary extension). An infeasible fit yields an
/// all-NaN trend — see the module docs for why this differs from
/// [`estimate_trend`]'s zero fallback.
pub fn ground_trend_from_ranging(times: &[f64], distance: &[f64], degree: usize) -> Vec<f64> {
    let detected = find_extrema(times, distance, ExtremaMode::Maxima, PEAK_MIN_DISTANCE);
    let (points, _) =
        reject_rolling_outliers(&detected, ROLLING_MEDIAN_WINDOW, ROLLING_MEDIAN_TOLERANCE);
    log::info!("{} ground-return candidates for the ranging trend", points.len());

    let mut trend = match fit_points(&points, degree) {
        Some(poly) => eval_trend(&poly, times),
        None => {
            log::warn!("not enough ground returns for a degree {degree} ranging trend");
            vec![f64::NAN; times.len()]
        }
    };
    fill_gaps(&mut trend);
    trend
}

/// Fit or signal fallback; insufficient points and singular systems both
/// mean "no trend available".
fn fit_points(points: &[Extremum], degree: usize) -> Option<Polynomial> {
    if points.len() <= degree {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|p| p.time).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.value).collect();
    polyfit(&xs, &ys, degree).ok()
}

/// Evaluate only where the time base is defined.
fn eval_trend(poly: &Polynomial, times: &[f64]) -> Vec<f64> {
    times
        .iter()
        .map(|&t| if t.is_finite() { poly.eval(t) } else { f64::NAN })
        .collect()
}

/// DegreeTuning state: loop until the operator accepts a degree.
fn tune_degree(
    op: &mut dyn Operator,
    times: &[f64],
    signal: &[f64],
    points: &[Extremum],
    mut degree: usize,
) -> ProcessingResult<usize> {
    loop {
        let trend = fit_points(points, degree).map(|poly| eval_trend(&poly, times));
        op.render(&FitView { times, signal, points, trend: trend.as_deref(), degree });

        let answer = op.prompt(&format!("Polynomial degree is {degree}. Accept? [y/n]: "))?;
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(degree),
            "n" | "no" => loop {
                let raw = op.prompt("New polynomial degree: ")?;
                match raw.trim().parse::<usize>() {
                    Ok(d) => {
                        degree = d;
                        break;
                    }
                    Err(_) => log::warn!("'{}' is not a valid degree, try again", raw.trim()),
                }
            },
            other => log::warn!("unrecognized answer '{other}', expected y or n"),
        }
    }
}

/// PointPruning state: loop until empty input or point exhaustion.
///
/// Display indices refer to the point list as currently rendered; removal
/// filters on enumerated identity in one pass, so a batch like "0,5,3"
/// never shifts under itself.
fn prune_points(
    op: &mut dyn Operator,
    times: &[f64],
    signal: &[f64],
    mut points: Vec<Extremum>,
    degree: usize,
) -> ProcessingResult<Vec<Extremum>> {
    loop {
        if points.len() <= degree {
            log::warn!(
                "only {} points left for a degree {degree} fit; ending pruning",
                points.len()
            );
            return Ok(points);
        }

        let trend = fit_points(&points, degree).map(|poly| eval_trend(&poly, times));
        op.render(&FitView { times, signal, points: &points, trend: trend.as_deref(), degree });

        let line = op.prompt("Indices to remove (comma separated, empty to finish): ")?;
        let line = line.trim();
        if line.is_empty() {
            return Ok(points);
        }

        let mut drop = BTreeSet::new();
        for token in line.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.parse::<usize>() {
                Ok(i) if i < points.len() => {
                    drop.insert(i);
                }
                Ok(i) => log::warn!("index {i} out of range, valid are 0..={}", points.len() - 1),
                Err(_) => log::warn!("'{token}' is not a valid index"),
            }
        }

        if !drop.is_empty() {
            points = points
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !drop.contains(i))
                .map(|(_, p)| p)
                .collect();
            log::info!("operator removed {} points, {} remain", drop.len(), points.len());
        }
    }
}
