//! CSV-Directory Repository
//!
//! One directory per survey, one file per table, named
//! `<log>.<key>.csv`. Raw sensor tables and processed tables share the
//! naming scheme; the key is the sensor id for raw data and a pipeline
//! constant for processed output. NaN cells are stored as empty fields
//! and come back as NaN, so the missing-value convention survives a
//! round trip.

use std::path::{Path, PathBuf};

use terralign_core::{
    errors::StoreError,
    repository::LogRepository,
    series::Table,
};

/// Filesystem-backed repository for one flight log
pub struct CsvRepository {
    dir: PathBuf,
    log_name: String,
}

impl CsvRepository {
    /// Open (or lazily create on first save) a repository rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>, log_name: impl Into<String>) -> Self {
        Self { dir: dir.into(), log_name: log_name.into() }
    }

    fn table_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{key}.csv", self.log_name))
    }
}

impl LogRepository for CsvRepository {
    fn raw_sensor_data(
        &mut self,
        sensors: &[&str],
    ) -> Result<std::collections::BTreeMap<String, Table>, StoreError> {
        let mut tables = std::collections::BTreeMap::new();
        for &sensor in sensors {
            let path = self.table_path(sensor);
            if !path.exists() {
                return Err(StoreError::MissingData { sensor: sensor.to_string() });
            }
            tables.insert(sensor.to_string(), read_table(&path, sensor)?);
        }
        Ok(tables)
    }

    fn save_processed(&mut self, table: &Table, key: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(table.names()).map_err(write_error)?;
            for row in 0..table.len() {
                let record = table.columns().iter().map(|c| {
                    let v = c.data[row];
                    if v.is_finite() { v.to_string() } else { String::new() }
                });
                writer.write_record(record).map_err(write_error)?;
            }
            writer.flush().map_err(StoreError::Io)?;
        }

        // Rename is the commit point: readers see old or new, never half.
        tmp.persist(self.table_path(key)).map_err(|e| StoreError::Io(e.error))?;
        log::debug!("saved table '{key}' ({} rows)", table.len());
        Ok(())
    }

    fn processed(&mut self, key: &str) -> Result<Table, StoreError> {
        let path = self.table_path(key);
        if !path.exists() {
            return Err(StoreError::NotFound { key: key.to_string() });
        }
        read_table(&path, key)
    }
}

fn read_table(path: &Path, key: &str) -> Result<Table, StoreError> {
    let malformed = |reason: String| StoreError::Malformed { key: key.to_string(), reason };

    let mut reader = csv::Reader::from_path(path).map_err(|e| malformed(e.to_string()))?;
    let headers: Vec<String> =
        reader.headers().map_err(|e| malformed(e.to_string()))?.iter().map(str::to_string).collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        if record.len() != headers.len() {
            return Err(malformed(format!(
                "row has {} fields, header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            let value = if field.is_empty() {
                f64::NAN
            } else {
                field.parse().map_err(|_| malformed(format!("'{field}' is not numeric")))?
            };
            column.push(value);
        }
    }

    let mut table = Table::new();
    for (name, data) in headers.into_iter().zip(columns) {
        table.insert(name, data);
    }
    Ok(table)
}

fn write_error(e: csv::Error) -> StoreError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => StoreError::Io(io),
        other => StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new()
            .with_column("TimeUS", vec![1000.0, 2000.0, 3000.0])
            .with_column("Alt", vec![10.5, f64::NAN, 12.0])
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CsvRepository::new(dir.path(), "flight_001");

        repo.save_processed(&sample_table(), "aligned_data").unwrap();
        let loaded = repo.processed("aligned_data").unwrap();

        assert_eq!(loaded.column("TimeUS").unwrap(), &[1000.0, 2000.0, 3000.0]);
        let alt = loaded.column("Alt").unwrap();
        assert_eq!(alt[0], 10.5);
        assert!(alt[1].is_nan());
        assert_eq!(alt[2], 12.0);
    }

    #[test]
    fn save_overwrites_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CsvRepository::new(dir.path(), "flight_001");

        repo.save_processed(&sample_table(), "aligned_data").unwrap();
        repo.save_processed(&sample_table(), "aligned_data").unwrap();

        let loaded = repo.processed("aligned_data").unwrap();
        assert_eq!(loaded.len(), 3);
        // Exactly one file for the key, no temp leftovers
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn missing_processed_table_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CsvRepository::new(dir.path(), "flight_001");
        let err = repo.processed("aligned_data").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn absent_sensor_is_missing_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CsvRepository::new(dir.path(), "flight_001");
        let err = repo.raw_sensor_data(&["GPS"]).unwrap_err();
        assert!(matches!(err, StoreError::MissingData { sensor } if sensor == "GPS"));
    }

    #[test]
    fn raw_sensor_files_share_the_naming_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = CsvRepository::new(dir.path(), "flight_001");

        // Raw extraction drops sensor tables under their sensor id key.
        repo.save_processed(&sample_table(), "GPS").unwrap();
        let raw = repo.raw_sensor_data(&["GPS"]).unwrap();
        let gps = &raw["GPS"];
        assert_eq!(gps.len(), 3);
        assert_eq!(gps.column("TimeUS").unwrap(), &[1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn non_numeric_cell_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight_001.BARO.csv");
        std::fs::write(&path, "TimeUS,Alt\n1000,abc\n").unwrap();

        let mut repo = CsvRepository::new(dir.path(), "flight_001");
        let err = repo.raw_sensor_data(&["BARO"]).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
