//! Terralign Core: Flight-Log Sensor Alignment and Terrain-Trend Estimation
//!
//! ## Overview
//!
//! Post-flight processing for UAV survey logs carrying a downward
//! rangefinder. The sensors tick on independent clocks, so nothing in a
//! raw log lines up: this crate resamples every stream onto the GPS time
//! base, separates the drone's altitude changes from the terrain relief
//! underneath, and emits clean tabular output for mapping and model
//! training.
//!
//! ```text
//! raw log ──→ alignment ──→ trend estimation ──→ filtering ──→ tables
//!  (GPS,       tolerance     extrema + polyfit    z-score       aligned_data
//!   RFND,      + windowed    (operator-refined)                 ml_features
//!   BARO,      medians
//!   TERR)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terralign_core::pipeline::{process_flight, FlightOptions};
//! # fn run(repo: &mut dyn terralign_core::repository::LogRepository)
//! #     -> terralign_core::errors::ProcessingResult<()> {
//! // Non-interactive run with default trend correction
//! let aligned = process_flight(repo, None, &FlightOptions::default())?;
//! println!("{} aligned rows", aligned.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **Batch semantics**: a whole flight is materialized and processed at
//!   once; every stage sees the full signal.
//! - **NaN is the missing value**: gaps propagate explicitly and are
//!   dropped in one place, at the end.
//! - **Injected boundaries**: storage ([`repository::LogRepository`]) and
//!   human interaction ([`operator::Operator`]) are traits, so the whole
//!   pipeline runs in tests without a filesystem or a terminal.
//! - **Soft fallbacks over hard failures**: an infeasible trend fit
//!   degrades to a documented fallback with a diagnostic, it does not
//!   abort a survey run.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod align;
pub mod constants;
pub mod errors;
pub mod features;
pub mod filters;
pub mod operator;
pub mod pipeline;
pub mod repository;
pub mod series;
mod stats;
pub mod time;
pub mod trend;

pub use align::{align_window_median, AlignedRanging};
pub use errors::{ProcessingError, ProcessingResult, StoreError};
pub use pipeline::{extract_features, process_flight, FlightOptions};
pub use repository::LogRepository;
pub use series::{SampleSeries, Table, Validity};
pub use time::{temporal_threshold, Timestamp};
pub use trend::{estimate_trend, TrendConfig, TrendOutcome};

/// Crate version, from the package manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
