use chrono::Weekday;

use crate::analyzers::types::TimeStats;
use crate::analyzers::utility::mode;
use crate::filters::weekday_name;
use crate::loader::TripDataset;

/// Most common month, weekday and start hour.
///
/// Returns `None` when the dataset is empty. Weekday ties go to the day that
/// comes first in a Monday-first week.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn time_stats(dataset: &TripDataset) -> Option<TimeStats> {
    let trips = &dataset.trips;
    let month = mode(trips.iter().map(|t| t.month()))?;
    let day = mode(trips.iter().map(|t| t.weekday().num_days_from_monday()))?;
    let hour = mode(trips.iter().map(|t| t.hour()))?;

    let day = Weekday::try_from(day as u8).ok()?;

    Some(TimeStats {
        most_common_month: month,
        most_common_day: weekday_name(day).to_string(),
        most_common_hour: hour,
    })
}
