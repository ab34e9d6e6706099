//! Municipality ranking for the crash distribution pie chart.

use super::rank_by_count;
use crate::data::CrashTable;
use std::collections::HashMap;

pub const MIN_TOP_CITIES: usize = 1;
pub const MAX_TOP_CITIES: usize = 20;

/// Summed crash count for one municipality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityCount {
    pub municipality: String,
    pub crashes: i64,
}

/// Top municipalities by summed crash count, plus the (clamped) N requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRanking {
    pub entries: Vec<CityCount>,
    pub n: usize,
}

impl CityRanking {
    /// Sum over the displayed slices only.
    pub fn displayed_total(&self) -> i64 {
        self.entries.iter().map(|e| e.crashes).sum()
    }

    /// Pie share of each displayed slice, in percent.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.displayed_total();
        self.entries
            .iter()
            .map(|e| {
                if total == 0 {
                    0.0
                } else {
                    e.crashes as f64 / total as f64 * 100.0
                }
            })
            .collect()
    }

    /// The municipality with the largest slice.
    pub fn leader(&self) -> Option<&CityCount> {
        self.entries.first()
    }
}

/// Rank municipalities by summed `crash_numb`.
///
/// `n` is clamped to `MIN_TOP_CITIES..=MAX_TOP_CITIES`. Rows without a
/// municipality are excluded; rows without a crash count still create their
/// municipality's group but add nothing to it.
pub fn top_cities(table: &CrashTable, n: usize) -> CityRanking {
    let n = n.clamp(MIN_TOP_CITIES, MAX_TOP_CITIES);

    let mut sums: HashMap<&str, i64> = HashMap::new();
    for record in table.records() {
        if let Some(city) = record.municipality.as_deref() {
            *sums.entry(city).or_insert(0) += record.crash_count.unwrap_or(0);
        }
    }

    let mut entries: Vec<CityCount> = sums
        .into_iter()
        .map(|(city, crashes)| CityCount {
            municipality: city.to_string(),
            crashes,
        })
        .collect();
    rank_by_count(&mut entries, |e| (e.crashes, e.municipality.as_str()));
    entries.truncate(n);

    CityRanking { entries, n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::*;

    fn pairs(ranking: &CityRanking) -> Vec<(&str, i64)> {
        ranking
            .entries
            .iter()
            .map(|e| (e.municipality.as_str(), e.crashes))
            .collect()
    }

    #[test]
    fn sums_and_ranks_by_crash_count() {
        let table = CrashTable::from_records(vec![
            in_city(1, "A", 2),
            in_city(2, "A", 1),
            in_city(3, "B", 5),
        ])
        .unwrap();

        let ranking = top_cities(&table, 2);
        assert_eq!(pairs(&ranking), vec![("B", 5), ("A", 3)]);
        assert_eq!(ranking.n, 2);
    }

    #[test]
    fn ties_break_by_name_ascending() {
        let table = CrashTable::from_records(vec![
            in_city(1, "WALTHAM", 3),
            in_city(2, "ACTON", 3),
            in_city(3, "MEDFORD", 3),
            in_city(4, "BOSTON", 9),
        ])
        .unwrap();

        let ranking = top_cities(&table, 20);
        assert_eq!(
            pairs(&ranking),
            vec![("BOSTON", 9), ("ACTON", 3), ("MEDFORD", 3), ("WALTHAM", 3)]
        );
    }

    #[test]
    fn every_n_in_range_is_sorted_and_sized() {
        let records: Vec<_> = (0..30)
            .map(|i| in_city(i, &format!("TOWN{:02}", i % 12), (i % 5) + 1))
            .collect();
        let table = CrashTable::from_records(records).unwrap();
        let distinct = table.municipalities().len();

        for n in MIN_TOP_CITIES..=MAX_TOP_CITIES {
            let ranking = top_cities(&table, n);
            assert_eq!(ranking.entries.len(), n.min(distinct));
            for pair in ranking.entries.windows(2) {
                let ordered = pair[0].crashes > pair[1].crashes
                    || (pair[0].crashes == pair[1].crashes
                        && pair[0].municipality < pair[1].municipality);
                assert!(ordered, "{:?} before {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn n_is_clamped() {
        let table = CrashTable::from_records(vec![in_city(1, "A", 1)]).unwrap();
        assert_eq!(top_cities(&table, 0).n, MIN_TOP_CITIES);
        assert_eq!(top_cities(&table, 99).n, MAX_TOP_CITIES);
    }

    #[test]
    fn rows_without_municipality_are_excluded() {
        let mut orphan = crash(2);
        orphan.crash_count = Some(50);
        let mut uncounted = crash(3);
        uncounted.municipality = Some("LOWELL".to_string());

        let table =
            CrashTable::from_records(vec![in_city(1, "A", 4), orphan, uncounted]).unwrap();
        let ranking = top_cities(&table, 10);
        assert_eq!(pairs(&ranking), vec![("A", 4), ("LOWELL", 0)]);
    }

    #[test]
    fn percentages_cover_displayed_slices() {
        let table = CrashTable::from_records(vec![
            in_city(1, "A", 1),
            in_city(2, "B", 3),
            in_city(3, "C", 100),
        ])
        .unwrap();
        let ranking = top_cities(&table, 2);
        let shares = ranking.percentages();
        assert_eq!(ranking.leader().map(|e| e.municipality.as_str()), Some("C"));
        assert!((shares.iter().sum::<f64>() - 100.0).abs() < 1e-9);
        assert!((shares[1] - 3.0 / 103.0 * 100.0).abs() < 1e-9);
    }
}
