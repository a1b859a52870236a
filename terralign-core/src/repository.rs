//! Repository Boundary for Raw and Processed Tables
//!
//! The pipeline never touches files or databases directly; it talks to a
//! [`LogRepository`] that owns one flight log's data. Raw sensor tables
//! come in, processed tables go out under well-known keys, and the
//! storage medium (CSV directory, in-memory map, anything else) is the
//! implementor's concern. Keeping this seam narrow is what lets the
//! integration tests run the full pipeline against a HashMap.

use std::collections::BTreeMap;

use crate::{errors::StoreError, series::Table};

/// Storage boundary for a single flight log
///
/// ## Contract
///
/// - `raw_sensor_data` returns one table per requested sensor id, keyed
///   by that id. A sensor with no backing data is
///   [`StoreError::MissingData`]; the caller decides whether that sensor
///   was optional.
/// - `save_processed` is an atomic overwrite: a concurrent reader sees
///   either the previous table or the new one, never a partial write.
///   Saving the same table twice is idempotent.
/// - `processed` returns [`StoreError::NotFound`] for a key never saved.
pub trait LogRepository {
    /// Fetch the raw tables for the requested sensors
    fn raw_sensor_data(&mut self, sensors: &[&str]) -> Result<BTreeMap<String, Table>, StoreError>;

    /// Persist a processed table under `key`, replacing any previous one
    fn save_processed(&mut self, table: &Table, key: &str) -> Result<(), StoreError>;

    /// Load a previously saved processed table
    fn processed(&mut self, key: &str) -> Result<Table, StoreError>;
}
