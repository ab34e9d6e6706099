//! Analysis module - the aggregation pipeline behind every dashboard view
//!
//! Each function takes the loaded [`CrashTable`](crate::data::CrashTable) by
//! reference plus the user's selection and returns a fresh result value.

mod cities;
mod junctions;
mod map;
mod monthly;

pub use cities::{top_cities, CityCount, CityRanking, MAX_TOP_CITIES, MIN_TOP_CITIES};
pub use junctions::{by_junction, causes, JunctionCount, JunctionCounts, UNREPORTED_JUNCTION};
pub use map::{project, MapPoint, MapProjection, Rgb, DEFAULT_MAP_ZOOM};
pub use monthly::{monthly, monthly_by_label, parse_month, InjuryCategory, MonthlyOverview, MonthlySeries};

use thiserror::Error;

/// Recoverable selection errors, shown in place of a chart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("No crashes with coordinates match the selected municipalities")]
    EmptySelection,
    #[error("Unknown crash cause: '{0}'")]
    UnknownCause(String),
    #[error("Invalid injury category: '{0}'")]
    InvalidCategory(String),
}

/// Descending by count, then ascending by label.
fn rank_by_count<T>(items: &mut [T], key: impl Fn(&T) -> (i64, &str)) {
    items.sort_by(|a, b| {
        let (count_a, label_a) = key(a);
        let (count_b, label_b) = key(b);
        count_b.cmp(&count_a).then_with(|| label_a.cmp(label_b))
    });
}
