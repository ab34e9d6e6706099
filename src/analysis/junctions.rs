//! Roadway junction types behind a selected crash cause.

use super::{rank_by_count, AnalysisError};
use crate::data::CrashTable;
use std::collections::{BTreeSet, HashMap};

/// Bucket for crashes whose junction type cell is blank.
///
/// Kept apart from the source's own "Not reported" value.
pub const UNREPORTED_JUNCTION: &str = "(blank)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionCount {
    pub junction_type: String,
    pub crashes: i64,
}

/// Junction type counts for one cause, most common first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionCounts {
    pub cause: String,
    pub entries: Vec<JunctionCount>,
}

impl JunctionCounts {
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| e.crashes).sum()
    }

    /// One line per junction type, in ranked order.
    pub fn insights(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{}: {} crashes", e.junction_type, e.crashes))
            .collect()
    }
}

/// Distinct crash causes present in the table, ascending.
pub fn causes(table: &CrashTable) -> Vec<String> {
    table
        .records()
        .iter()
        .filter_map(|r| r.cause.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Count the junction types of every crash with the given cause.
pub fn by_junction(table: &CrashTable, cause: &str) -> Result<JunctionCounts, AnalysisError> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for record in table.records() {
        if record.cause.as_deref() != Some(cause) {
            continue;
        }
        let junction = record.junction_type.as_deref().unwrap_or(UNREPORTED_JUNCTION);
        *counts.entry(junction).or_insert(0) += 1;
    }

    if counts.is_empty() {
        return Err(AnalysisError::UnknownCause(cause.to_string()));
    }

    let mut entries: Vec<JunctionCount> = counts
        .into_iter()
        .map(|(junction_type, crashes)| JunctionCount {
            junction_type: junction_type.to_string(),
            crashes,
        })
        .collect();
    rank_by_count(&mut entries, |e| (e.crashes, e.junction_type.as_str()));

    Ok(JunctionCounts {
        cause: cause.to_string(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::*;
    use crate::data::CrashRecord;

    const REAR_END: &str = "(V1: Collision with motor vehicle in traffic)";
    const CURB: &str = "(V1: Collision with curb)";

    fn caused(id: i64, cause: &str, junction: Option<&str>) -> CrashRecord {
        CrashRecord {
            cause: Some(cause.to_string()),
            junction_type: junction.map(str::to_string),
            ..crash(id)
        }
    }

    fn sample() -> CrashTable {
        CrashTable::from_records(vec![
            caused(1, REAR_END, Some("Four-way intersection")),
            caused(2, REAR_END, Some("Not at junction")),
            caused(3, REAR_END, Some("Four-way intersection")),
            caused(4, REAR_END, None),
            caused(5, REAR_END, Some("T-intersection")),
            caused(6, CURB, Some("Not at junction")),
            crash(7),
        ])
        .unwrap()
    }

    #[test]
    fn counts_sum_to_rows_with_cause() {
        let table = sample();
        let counts = by_junction(&table, REAR_END).unwrap();
        let matching = table
            .records()
            .iter()
            .filter(|r| r.cause.as_deref() == Some(REAR_END))
            .count();
        assert_eq!(counts.total(), matching as i64);
    }

    #[test]
    fn ranked_descending_with_label_tie_break() {
        let counts = by_junction(&sample(), REAR_END).unwrap();
        let ranked: Vec<(&str, i64)> = counts
            .entries
            .iter()
            .map(|e| (e.junction_type.as_str(), e.crashes))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("Four-way intersection", 2),
                (UNREPORTED_JUNCTION, 1),
                ("Not at junction", 1),
                ("T-intersection", 1),
            ]
        );
        assert_eq!(counts.insights()[0], "Four-way intersection: 2 crashes");
    }

    #[test]
    fn unknown_or_empty_cause_is_rejected() {
        let table = sample();
        assert_eq!(
            by_junction(&table, "(V1: Jackknife)"),
            Err(AnalysisError::UnknownCause("(V1: Jackknife)".to_string()))
        );
        assert_eq!(
            by_junction(&table, ""),
            Err(AnalysisError::UnknownCause(String::new()))
        );
    }

    #[test]
    fn causes_are_distinct_and_sorted() {
        assert_eq!(causes(&sample()), vec![CURB, REAR_END]);
    }

    #[test]
    fn blank_cells_stay_apart_from_reported_not_reported() {
        let table = CrashTable::from_records(vec![
            caused(1, CURB, None),
            caused(2, CURB, Some("Not reported")),
        ])
        .unwrap();
        let counts = by_junction(&table, CURB).unwrap();
        let ranked: Vec<(&str, i64)> = counts
            .entries
            .iter()
            .map(|e| (e.junction_type.as_str(), e.crashes))
            .collect();
        assert_eq!(ranked, vec![(UNREPORTED_JUNCTION, 1), ("Not reported", 1)]);
    }
}
