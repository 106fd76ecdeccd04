//! Data types produced by the statistics passes.

use serde::Serialize;

use crate::filters::City;

/// Result for a column that only some city files carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Demographic<T> {
    /// The city's file has no such column.
    Unavailable,
    /// The column exists but no filtered trip has a value in it.
    NoData,
    Known(T),
}

impl<T> Demographic<T> {
    pub fn is_available(&self) -> bool {
        !matches!(self, Demographic::Unavailable)
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Demographic::Known(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-value counts of a categorical column, highest first, plus the number of
/// blank cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryCounts {
    pub counts: Vec<(String, usize)>,
    pub blank: usize,
}

impl CategoryCounts {
    /// Sum of all counts including blanks; equals the number of trips counted.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum::<usize>() + self.blank
    }
}

/// Most frequent times of travel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStats {
    pub most_common_month: u32,
    pub most_common_day: String,
    pub most_common_hour: u32,
}

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationStats {
    pub most_common_start: String,
    pub most_common_end: String,
    pub most_common_trip: (String, String),
}

/// Total and average trip duration, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub trip_count: usize,
    pub total_secs: f64,
    pub mean_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

/// Bikeshare user breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub user_types: CategoryCounts,
    pub gender: Demographic<CategoryCounts>,
    pub birth_year: Demographic<BirthYearStats>,
}

/// Seconds spent in each pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassTimings {
    pub time: f64,
    pub stations: f64,
    pub duration: f64,
    pub users: f64,
}

/// Everything computed for one filtered dataset. Non-demographic sections are
/// `None` when no trip matched the filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub city: City,
    pub month: String,
    pub day: String,
    pub trip_count: usize,
    pub time: Option<TimeStats>,
    pub stations: Option<StationStats>,
    pub duration: Option<DurationStats>,
    pub users: UserStats,
    pub timings: PassTimings,
}
