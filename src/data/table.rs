//! Crash Table Module
//! Typed crash records and the immutable, id-keyed table shared by every view.

use super::loader::LoadError;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Normalized (lower-case) column names consumed by the pipeline.
pub mod columns {
    pub const ID: &str = "objectid";
    pub const MUNICIPALITY: &str = "city_town_name";
    pub const CRASH_COUNT: &str = "crash_numb";
    pub const LATITUDE: &str = "lat";
    pub const LONGITUDE: &str = "lon";
    pub const NONFATAL_INJURIES: &str = "numb_nonfatal_injr";
    pub const FATAL_INJURIES: &str = "numb_fatal_injr";
    pub const CRASH_DATETIME: &str = "crash_datetime";
    pub const CAUSE: &str = "vehc_seq_events_cl";
    pub const JUNCTION_TYPE: &str = "rdwy_jnct_type_descr";
    pub const ROADWAY: &str = "rdwy";

    /// Every column the loader requires, key first.
    pub const REQUIRED: [&str; 11] = [
        ID,
        MUNICIPALITY,
        CRASH_COUNT,
        LATITUDE,
        LONGITUDE,
        NONFATAL_INJURIES,
        FATAL_INJURIES,
        CRASH_DATETIME,
        CAUSE,
        JUNCTION_TYPE,
        ROADWAY,
    ];
}

/// One crash row. Every attribute except the id may be absent in the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrashRecord {
    pub id: i64,
    pub municipality: Option<String>,
    pub crash_count: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub nonfatal_injuries: Option<i64>,
    pub fatal_injuries: Option<i64>,
    pub crash_datetime: Option<String>,
    pub cause: Option<String>,
    pub junction_type: Option<String>,
    pub roadway: Option<String>,
}

impl CrashRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// `(lat, lon)` when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// In-memory crash table keyed by `objectid`, in file order.
///
/// Immutable once built: the analysis functions only ever borrow it.
#[derive(Debug, Clone)]
pub struct CrashTable {
    records: Vec<CrashRecord>,
    /// `objectid` to position in `records`.
    index: HashMap<i64, usize>,
    frame: DataFrame,
}

impl CrashTable {
    /// Build a table from a normalized frame and the records extracted from it.
    pub(super) fn with_frame(records: Vec<CrashRecord>, frame: DataFrame) -> Result<Self, LoadError> {
        let index = Self::index_ids(&records)?;
        Ok(Self {
            records,
            index,
            frame,
        })
    }

    /// Build a table from records alone; the raw frame holds the pipeline columns.
    pub fn from_records(records: Vec<CrashRecord>) -> Result<Self, LoadError> {
        let index = Self::index_ids(&records)?;
        let frame = Self::records_to_frame(&records)?;
        Ok(Self {
            records,
            index,
            frame,
        })
    }

    fn index_ids(records: &[CrashRecord]) -> Result<HashMap<i64, usize>, LoadError> {
        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.id, position).is_some() {
                return Err(LoadError::DuplicateId(record.id));
            }
        }
        Ok(index)
    }

    fn records_to_frame(records: &[CrashRecord]) -> Result<DataFrame, LoadError> {
        let df = DataFrame::new(vec![
            Column::new(
                columns::ID.into(),
                records.iter().map(|r| r.id).collect::<Vec<i64>>(),
            ),
            string_column(records, columns::MUNICIPALITY, |r| r.municipality.clone()),
            Column::new(
                columns::CRASH_COUNT.into(),
                records.iter().map(|r| r.crash_count).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::LATITUDE.into(),
                records.iter().map(|r| r.latitude).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::LONGITUDE.into(),
                records.iter().map(|r| r.longitude).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::NONFATAL_INJURIES.into(),
                records.iter().map(|r| r.nonfatal_injuries).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::FATAL_INJURIES.into(),
                records.iter().map(|r| r.fatal_injuries).collect::<Vec<_>>(),
            ),
            string_column(records, columns::CRASH_DATETIME, |r| r.crash_datetime.clone()),
            string_column(records, columns::CAUSE, |r| r.cause.clone()),
            string_column(records, columns::JUNCTION_TYPE, |r| r.junction_type.clone()),
            string_column(records, columns::ROADWAY, |r| r.roadway.clone()),
        ])?;

        Ok(df)
    }

    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its key.
    pub fn get(&self, id: i64) -> Option<&CrashRecord> {
        self.index.get(&id).and_then(|&i| self.records.get(i))
    }

    /// The normalized raw frame (all source columns, lower-case names).
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Distinct municipality names, ascending.
    pub fn municipalities(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.municipality.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn string_column(
    records: &[CrashRecord],
    name: &str,
    value: impl Fn(&CrashRecord) -> Option<String>,
) -> Column {
    Column::new(name.into(), records.iter().map(value).collect::<Vec<_>>())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::CrashRecord;

    /// Record builder used across the analysis tests.
    pub fn crash(id: i64) -> CrashRecord {
        CrashRecord::new(id)
    }

    pub fn in_city(id: i64, city: &str, count: i64) -> CrashRecord {
        CrashRecord {
            municipality: Some(city.to_string()),
            crash_count: Some(count),
            ..CrashRecord::new(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn rejects_duplicate_ids() {
        let err = CrashTable::from_records(vec![crash(1), crash(2), crash(1)]).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId(1)));
    }

    #[test]
    fn frame_mirrors_records() {
        let table =
            CrashTable::from_records(vec![in_city(7, "BOSTON", 1), in_city(9, "SALEM", 2)])
                .unwrap();
        let frame = table.frame();
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), columns::REQUIRED.len());
        assert_eq!(table.get(9).and_then(|r| r.crash_count), Some(2));
        assert!(table.get(8).is_none());
    }

    #[test]
    fn get_finds_records_by_key_not_position() {
        let table = CrashTable::from_records(vec![
            in_city(42, "BOSTON", 1),
            in_city(3, "SALEM", 2),
            in_city(1000, "LYNN", 3),
        ])
        .unwrap();
        assert_eq!(
            table.get(1000).and_then(|r| r.municipality.as_deref()),
            Some("LYNN")
        );
        assert_eq!(table.get(3).map(|r| r.id), Some(3));
        assert!(table.get(0).is_none());
        assert!(table.get(2).is_none());
    }

    #[test]
    fn municipalities_are_distinct_and_sorted() {
        let mut unnamed = crash(4);
        unnamed.crash_count = Some(1);
        let table = CrashTable::from_records(vec![
            in_city(1, "WORCESTER", 1),
            in_city(2, "BOSTON", 1),
            in_city(3, "WORCESTER", 1),
            unnamed,
        ])
        .unwrap();
        assert_eq!(table.municipalities(), vec!["BOSTON", "WORCESTER"]);
    }

    #[test]
    fn coordinates_require_both_finite_values() {
        let mut record = crash(1);
        record.latitude = Some(42.3);
        assert_eq!(record.coordinates(), None);
        record.longitude = Some(f64::NAN);
        assert_eq!(record.coordinates(), None);
        record.longitude = Some(-71.0);
        assert_eq!(record.coordinates(), Some((42.3, -71.0)));
    }
}
