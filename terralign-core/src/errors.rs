//! Error Types for the Alignment and Trend-Estimation Pipeline
//!
//! ## Design Philosophy
//!
//! Errors are split along the pipeline's two fault domains:
//!
//! 1. **`ProcessingError`** — faults in the numeric core. Missing or
//!    malformed columns are programming/configuration errors upstream and
//!    are fatal; too few samples for an operation is reported explicitly
//!    rather than producing silently-wrong numbers.
//!
//! 2. **`StoreError`** — faults at the repository boundary (raw sensor
//!    tables, processed tables). These are recoverable by the caller:
//!    a missing processed table usually means "run the prior stage first".
//!
//! Soft conditions deliberately do NOT surface here. When the ground-trend
//! estimator has fewer surviving extrema than the polynomial degree needs,
//! the documented fallback is an all-zero trend plus a diagnostic log line,
//! not an error — see [`crate::trend`].
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use terralign_core::errors::{ProcessingError, StoreError};
//!
//! fn report(err: &ProcessingError) {
//!     match err {
//!         ProcessingError::DataShape { sensor, column } => {
//!             // Upstream extraction produced a malformed table - fix config
//!             eprintln!("sensor {sensor} is missing column {column}");
//!         }
//!         ProcessingError::Store(StoreError::NotFound { .. }) => {
//!             // Prior pipeline stage has not run yet
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for core pipeline operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Errors raised by the numeric core
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A required column is absent from an input sensor table
    ///
    /// Malformed upstream extraction is a configuration error, not a
    /// transient condition: fatal, never retried.
    #[error("sensor '{sensor}' table is missing required column '{column}'")]
    DataShape {
        /// Sensor whose table failed the shape check
        sensor: &'static str,
        /// Column that was expected but not found
        column: &'static str,
    },

    /// Too few samples for the requested operation
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData {
        /// Minimum number of samples the operation needs
        required: usize,
        /// Number of samples actually available
        available: usize,
    },

    /// Operator supplied input that cannot be used (interactive mode only)
    ///
    /// Recovered locally by re-prompting; surfaces only if the operator
    /// channel itself breaks.
    #[error("invalid operator input: {0}")]
    InvalidInput(String),

    /// The interactive operator channel itself failed
    #[error("operator i/o failed: {0}")]
    OperatorIo(std::io::Error),

    /// Failure at the storage boundary
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by `LogRepository` implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A requested sensor has no backing data after an extraction attempt
    #[error("no data for sensor '{sensor}' in this log")]
    MissingData {
        /// Sensor id that could not be resolved
        sensor: String,
    },

    /// A requested processed table was never saved for this log
    #[error("processed table '{key}' not found; run the prior stage first")]
    NotFound {
        /// Table key that was requested
        key: String,
    },

    /// Stored table contents could not be decoded
    #[error("malformed table '{key}': {reason}")]
    Malformed {
        /// Table key being decoded
        key: String,
        /// What went wrong
        reason: String,
    },

    /// Underlying I/O failure
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}
