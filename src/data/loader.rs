//! Crash CSV Loader Module
//! Reads the crash record file with Polars, normalizes column names and
//! materializes the id-keyed crash table.

use super::table::{columns, CrashRecord, CrashTable};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Rows sampled for schema inference when none is configured.
pub const DEFAULT_INFER_SCHEMA_ROWS: usize = 10_000;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Crash file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Row {row} has no '{col}' value", col = columns::ID)]
    MissingId { row: usize },
    #[error("Duplicate '{col}' value {0}", col = columns::ID)]
    DuplicateId(i64),
}

/// Loads crash CSV files into a [`CrashTable`].
#[derive(Debug, Clone)]
pub struct CrashLoader {
    infer_schema_rows: usize,
}

impl Default for CrashLoader {
    fn default() -> Self {
        Self::new(DEFAULT_INFER_SCHEMA_ROWS)
    }
}

impl CrashLoader {
    pub fn new(infer_schema_rows: usize) -> Self {
        Self {
            infer_schema_rows: infer_schema_rows.max(1),
        }
    }

    /// Load a crash CSV file.
    ///
    /// Column names are lower-cased before lookup, so `OBJECTID` and
    /// `objectid` are the same column. Values that fail to parse as the
    /// inferred column type become missing values rather than errors.
    pub fn load(&self, path: &Path) -> Result<CrashTable, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let mut df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(self.infer_schema_rows))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        Self::lowercase_columns(&mut df)?;
        Self::check_required_columns(&df)?;

        let records = Self::extract_records(&df)?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded crash records"
        );

        CrashTable::with_frame(records, df)
    }

    fn lowercase_columns(df: &mut DataFrame) -> Result<(), LoadError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
        df.set_column_names(names)?;
        Ok(())
    }

    fn check_required_columns(df: &DataFrame) -> Result<(), LoadError> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for required in columns::REQUIRED {
            if !present.iter().any(|name| name == required) {
                return Err(LoadError::MissingColumn(required.to_string()));
            }
        }
        Ok(())
    }

    fn extract_records(df: &DataFrame) -> Result<Vec<CrashRecord>, LoadError> {
        let ids = int_values(df, columns::ID)?;
        let municipalities = string_values(df, columns::MUNICIPALITY)?;
        let crash_counts = int_values(df, columns::CRASH_COUNT)?;
        let latitudes = float_values(df, columns::LATITUDE)?;
        let longitudes = float_values(df, columns::LONGITUDE)?;
        let nonfatal = int_values(df, columns::NONFATAL_INJURIES)?;
        let fatal = int_values(df, columns::FATAL_INJURIES)?;
        let datetimes = string_values(df, columns::CRASH_DATETIME)?;
        let causes = string_values(df, columns::CAUSE)?;
        let junctions = string_values(df, columns::JUNCTION_TYPE)?;
        let roadways = string_values(df, columns::ROADWAY)?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let id = ids[i].ok_or(LoadError::MissingId { row: i })?;
            records.push(CrashRecord {
                id,
                municipality: municipalities[i].clone(),
                crash_count: crash_counts[i],
                latitude: latitudes[i],
                longitude: longitudes[i],
                nonfatal_injuries: nonfatal[i],
                fatal_injuries: fatal[i],
                crash_datetime: datetimes[i].clone(),
                cause: causes[i].clone(),
                junction_type: junctions[i].clone(),
                roadway: roadways[i].clone(),
            });
        }

        debug!(records = records.len(), "Extracted typed crash records");
        Ok(records)
    }
}

/// Text values of a column; blank cells are missing.
fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoadError> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        })
        .collect();
    Ok(values)
}

fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, LoadError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let values = column.as_materialized_series().i64()?.into_iter().collect();
    Ok(values)
}

/// Float values of a column; NaN cells are missing.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, LoadError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column
        .as_materialized_series()
        .f64()?
        .into_iter()
        .map(|v| v.filter(|f| !f.is_nan()))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "OBJECTID,CITY_TOWN_NAME,CRASH_NUMB,LAT,LON,NUMB_NONFATAL_INJR,NUMB_FATAL_INJR,CRASH_DATETIME,VEHC_SEQ_EVENTS_CL,RDWY_JNCT_TYPE_DESCR,RDWY,EXTRA_COL";

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_records_with_lowercase_columns() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             11,BOSTON,1,42.35,-71.06,2,0,2017/03/04 10:00:00+00,(V1: Collision with motor vehicle in traffic),Four-way intersection,WASHINGTON ST,a\n\
             12,SALEM,1,,,0,1,2017/07/01 08:30:00+00,(V1: Collision with curb),Not at junction,,b\n"
        ));

        let table = CrashLoader::default().load(file.path()).unwrap();
        assert_eq!(table.len(), 2);

        let names: Vec<String> = table
            .frame()
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(names.contains(&"objectid".to_string()));
        assert!(names.contains(&"extra_col".to_string()));

        let boston = table.get(11).unwrap();
        assert_eq!(boston.municipality.as_deref(), Some("BOSTON"));
        assert_eq!(boston.nonfatal_injuries, Some(2));
        assert_eq!(boston.coordinates(), Some((42.35, -71.06)));
        assert_eq!(boston.roadway.as_deref(), Some("WASHINGTON ST"));

        let salem = table.get(12).unwrap();
        assert_eq!(salem.coordinates(), None);
        assert_eq!(salem.roadway, None);
        assert_eq!(salem.fatal_injuries, Some(1));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = CrashLoader::default()
            .load(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn missing_id_column_is_reported() {
        let file = write_csv("CITY_TOWN_NAME,CRASH_NUMB\nBOSTON,1\n");
        let err = CrashLoader::default().load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "objectid"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             5,BOSTON,1,42.3,-71.0,0,0,2017/01/01 00:00:00+00,x,y,z,a\n\
             5,SALEM,1,42.5,-70.9,0,0,2017/01/02 00:00:00+00,x,y,z,b\n"
        ));
        let err = CrashLoader::default().load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId(5)));
        assert_eq!(err.to_string(), "Duplicate 'objectid' value 5");
    }

    #[test]
    fn blank_id_cell_is_reported_with_its_row() {
        let file = write_csv(&format!(
            "{HEADER}\n\
             7,BOSTON,1,42.3,-71.0,1,0,2017/01/01 00:00:00+00,x,y,z,a\n\
             ,SALEM,1,42.5,-70.9,0,0,2017/01/02 00:00:00+00,x,y,z,b\n"
        ));
        let err = CrashLoader::default().load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingId { row: 1 }));
        assert_eq!(err.to_string(), "Row 1 has no 'objectid' value");
    }

    #[test]
    fn directory_path_is_not_a_crash_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CrashLoader::default().load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(ref p) if p == dir.path()));
    }

    #[test]
    fn unparseable_file_maps_to_csv_error() {
        let file = write_csv("");
        let err = CrashLoader::default().load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }
}
