//! Monthly distribution of injury crashes.

use super::AnalysisError;
use crate::data::{CrashRecord, CrashTable};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Which injury columns feed the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjuryCategory {
    #[default]
    NonFatal,
    Fatal,
    Both,
}

impl InjuryCategory {
    pub const ALL: [InjuryCategory; 3] = [Self::NonFatal, Self::Fatal, Self::Both];

    pub fn label(self) -> &'static str {
        match self {
            Self::NonFatal => "Non-Fatalities Injuries",
            Self::Fatal => "Fatalities Injuries",
            Self::Both => "Non-Fatalities & Fatalities Injuries",
        }
    }

    pub fn includes_nonfatal(self) -> bool {
        matches!(self, Self::NonFatal | Self::Both)
    }

    pub fn includes_fatal(self) -> bool {
        matches!(self, Self::Fatal | Self::Both)
    }
}

impl fmt::Display for InjuryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InjuryCategory {
    type Err = AnalysisError;

    /// Accepts the display labels and the short forms `nonfatal`, `fatal`, `both`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        if let Some(category) = Self::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == key)
        {
            return Ok(category);
        }
        match key.as_str() {
            "nonfatal" | "non-fatal" | "non_fatal" => Ok(Self::NonFatal),
            "fatal" => Ok(Self::Fatal),
            "both" => Ok(Self::Both),
            _ => Err(AnalysisError::InvalidCategory(s.to_string())),
        }
    }
}

/// Month number (1-12) to count of qualifying crashes.
///
/// Months without a qualifying crash are absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySeries {
    pub counts: BTreeMap<u32, u64>,
}

impl MonthlySeries {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Month with the highest count; the earliest month wins a tie.
    pub fn peak(&self) -> Option<(u32, u64)> {
        self.counts
            .iter()
            .fold(None, |best: Option<(u32, u64)>, (&month, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((month, count)),
            })
    }

    pub fn points(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.counts.iter().map(|(&m, &c)| (m, c))
    }
}

/// Both monthly series for a category plus the injury total.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyOverview {
    pub category: InjuryCategory,
    pub nonfatal: MonthlySeries,
    pub fatal: MonthlySeries,
    /// Sum of the relevant injury column(s) over the whole table.
    pub total: i64,
    /// Qualifying rows left out because their timestamp did not parse.
    pub skipped_timestamps: usize,
}

/// Build the monthly overview for `category`.
pub fn monthly(table: &CrashTable, category: InjuryCategory) -> MonthlyOverview {
    let mut skipped_timestamps = 0;
    let mut nonfatal = MonthlySeries::default();
    let mut fatal = MonthlySeries::default();
    let mut total = 0;

    if category.includes_nonfatal() {
        let (series, skipped) = series_for(table, |r| r.nonfatal_injuries);
        nonfatal = series;
        skipped_timestamps += skipped;
        total += column_total(table, |r| r.nonfatal_injuries);
    }
    if category.includes_fatal() {
        let (series, skipped) = series_for(table, |r| r.fatal_injuries);
        fatal = series;
        skipped_timestamps += skipped;
        total += column_total(table, |r| r.fatal_injuries);
    }

    if skipped_timestamps > 0 {
        debug!(
            skipped = skipped_timestamps,
            category = %category,
            "Skipped crashes with unparseable timestamps"
        );
    }

    MonthlyOverview {
        category,
        nonfatal,
        fatal,
        total,
        skipped_timestamps,
    }
}

/// Build the monthly overview for a category given by name.
pub fn monthly_by_label(table: &CrashTable, label: &str) -> Result<MonthlyOverview, AnalysisError> {
    let category = label.parse()?;
    Ok(monthly(table, category))
}

fn series_for(
    table: &CrashTable,
    injuries: impl Fn(&CrashRecord) -> Option<i64>,
) -> (MonthlySeries, usize) {
    let mut series = MonthlySeries::default();
    let mut skipped = 0;

    for record in table.records() {
        if injuries(record).unwrap_or(0) <= 0 {
            continue;
        }
        match record.crash_datetime.as_deref().and_then(parse_month) {
            Some(month) => *series.counts.entry(month).or_insert(0) += 1,
            None => skipped += 1,
        }
    }

    (series, skipped)
}

fn column_total(table: &CrashTable, injuries: impl Fn(&CrashRecord) -> Option<i64>) -> i64 {
    table.records().iter().filter_map(injuries).sum()
}

const OFFSET_FORMATS: [&str; 2] = ["%Y/%m/%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%#z"];

const DATETIME_FORMATS: [&str; 10] = [
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d-%b-%Y %I:%M %p",
];

const DATE_FORMATS: [&str; 4] = ["%Y/%m/%d", "%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y"];

/// Month number of a crash timestamp, or `None` if it matches no known layout.
pub fn parse_month(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.month());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.month());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        return Some(dt.month());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .map(|d| d.month())
}
