//! Sensor Sample Streams and Tabular Data
//!
//! ## Overview
//!
//! Flight logs yield one stream per physical sensor (GPS altitude,
//! barometer, downward rangefinder, terrain reference). Streams are
//! independently clocked: timestamps are monotonically non-decreasing but
//! neither uniformly spaced nor synchronized across sensors. The GPS
//! stream defines the canonical time base everything else is resampled
//! onto — see [`crate::align`].
//!
//! Two representations live here:
//!
//! - [`SampleSeries`] — a single sensor's stream: parallel timestamp and
//!   value vectors plus an optional per-sample validity flag derived from
//!   the sensor's status column.
//! - [`Table`] — ordered named `f64` columns of equal length, the shape
//!   raw and processed data cross the repository boundary in. NaN is the
//!   missing-value representation and propagates; it is never silently
//!   zeroed by this layer.
//!
//! Both are transient value objects; nothing here holds shared state.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ProcessingError, ProcessingResult},
    time::Timestamp,
};

/// Per-sample validity as reported by the sensor's status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Status code indicated a good reading
    Valid,
    /// Status code indicated a failed or degraded reading
    Invalid,
}

/// One sensor's measurement stream
///
/// Timestamps are microseconds and must be sorted ascending; the aligners
/// rely on this for binary-search windowing.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
    validity: Option<Vec<Validity>>,
}

impl SampleSeries {
    /// Create a series without validity information
    ///
    /// Panics if the vectors differ in length; streams are extracted
    /// column-wise from one table, so a mismatch is a programming error.
    pub fn new(timestamps: Vec<Timestamp>, values: Vec<f64>) -> Self {
        assert_eq!(timestamps.len(), values.len(), "timestamp/value length mismatch");
        Self { timestamps, values, validity: None }
    }

    /// Create a series with a per-sample validity flag
    pub fn with_validity(
        timestamps: Vec<Timestamp>,
        values: Vec<f64>,
        validity: Vec<Validity>,
    ) -> Self {
        assert_eq!(timestamps.len(), values.len(), "timestamp/value length mismatch");
        assert_eq!(timestamps.len(), validity.len(), "timestamp/validity length mismatch");
        Self { timestamps, values, validity: Some(validity) }
    }

    /// Extract a series from a raw sensor table
    ///
    /// `status` optionally names a status column and the code that marks a
    /// good reading; any other code flags the sample [`Validity::Invalid`].
    /// Missing columns are a [`ProcessingError::DataShape`] error.
    pub fn from_table(
        table: &Table,
        sensor: &'static str,
        time_col: &'static str,
        value_col: &'static str,
        status: Option<(&'static str, f64)>,
    ) -> ProcessingResult<Self> {
        let times = table
            .column(time_col)
            .ok_or(ProcessingError::DataShape { sensor, column: time_col })?;
        let values = table
            .column(value_col)
            .ok_or(ProcessingError::DataShape { sensor, column: value_col })?;

        let timestamps: Vec<Timestamp> = times.iter().map(|&t| t as Timestamp).collect();
        let values = values.to_vec();

        let validity = match status {
            Some((status_col, good_code)) => {
                let codes = table
                    .column(status_col)
                    .ok_or(ProcessingError::DataShape { sensor, column: status_col })?;
                Some(
                    codes
                        .iter()
                        .map(|&c| if c == good_code { Validity::Valid } else { Validity::Invalid })
                        .collect(),
                )
            }
            None => None,
        };

        Ok(Self { timestamps, values, validity })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the stream is empty
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sorted sample timestamps (microseconds)
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Sample values, index-aligned with [`Self::timestamps`]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Validity of sample `i`; streams without a status column are all-valid
    pub fn is_valid(&self, i: usize) -> bool {
        match &self.validity {
            Some(v) => v[i] == Validity::Valid,
            None => true,
        }
    }
}

/// A named column of `f64` data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Column name, unique within its table
    pub name: String,
    /// Column data; NaN marks missing values
    pub data: Vec<f64>,
}

/// Ordered collection of equal-length named columns
///
/// This is the tabular shape shared with the repository collaborator.
/// Column order is preserved so persisted output is reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style
    ///
    /// Panics if the column length disagrees with columns already present.
    pub fn with_column(mut self, name: impl Into<String>, data: Vec<f64>) -> Self {
        self.insert(name, data);
        self
    }

    /// Append a column in place
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<f64>) {
        if let Some(first) = self.columns.first() {
            assert_eq!(first.data.len(), data.len(), "column length mismatch");
        }
        self.columns.push(Column { name: name.into(), data });
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.data.as_slice())
    }

    /// Column names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// All columns in insertion order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows (0 for a table with no columns)
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of this table with every row containing a NaN removed
    ///
    /// Matches the original pipeline's behavior of dropping incomplete
    /// rows before persisting a processed table.
    pub fn drop_nan_rows(&self) -> Table {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| self.columns.iter().all(|c| c.data[row].is_finite()))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: keep.iter().map(|&row| c.data[row]).collect(),
            })
            .collect();

        Table { columns }
    }
}
