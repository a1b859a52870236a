//! In-Memory Repository
//!
//! Map-backed implementation of the repository contract. Used by the
//! integration tests to run the full pipeline without a filesystem, and
//! useful for embedding when tables come from somewhere other than disk.

use std::collections::{BTreeMap, HashMap};

use terralign_core::{errors::StoreError, repository::LogRepository, series::Table};

/// Repository holding all tables in process memory
#[derive(Default)]
pub struct MemoryRepository {
    raw: BTreeMap<String, Table>,
    processed: HashMap<String, Table>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw sensor table, builder style
    pub fn with_sensor(mut self, sensor: impl Into<String>, table: Table) -> Self {
        self.raw.insert(sensor.into(), table);
        self
    }
}

impl LogRepository for MemoryRepository {
    fn raw_sensor_data(&mut self, sensors: &[&str]) -> Result<BTreeMap<String, Table>, StoreError> {
        let mut tables = BTreeMap::new();
        for &sensor in sensors {
            let table = self
                .raw
                .get(sensor)
                .ok_or_else(|| StoreError::MissingData { sensor: sensor.to_string() })?;
            tables.insert(sensor.to_string(), table.clone());
        }
        Ok(tables)
    }

    fn save_processed(&mut self, table: &Table, key: &str) -> Result<(), StoreError> {
        self.processed.insert(key.to_string(), table.clone());
        Ok(())
    }

    fn processed(&mut self, key: &str) -> Result<Table, StoreError> {
        self.processed
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { key: key.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sensors_are_returned() {
        let gps = Table::new().with_column("TimeUS", vec![0.0, 1.0]);
        let mut repo = MemoryRepository::new().with_sensor("GPS", gps.clone());

        let raw = repo.raw_sensor_data(&["GPS"]).unwrap();
        assert_eq!(raw["GPS"], gps);
    }

    #[test]
    fn unseeded_sensor_is_missing_data() {
        let mut repo = MemoryRepository::new();
        let err = repo.raw_sensor_data(&["RFND"]).unwrap_err();
        assert!(matches!(err, StoreError::MissingData { sensor } if sensor == "RFND"));
    }

    #[test]
    fn processed_round_trip_and_not_found() {
        let mut repo = MemoryRepository::new();
        assert!(matches!(repo.processed("x").unwrap_err(), StoreError::NotFound { .. }));

        let table = Table::new().with_column("a", vec![1.0]);
        repo.save_processed(&table, "x").unwrap();
        assert_eq!(repo.processed("x").unwrap(), table);
    }
}
