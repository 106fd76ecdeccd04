use crate::analyzers::types::DurationStats;
use crate::loader::TripDataset;

/// Total and mean trip duration. `None` for an empty dataset rather than a
/// division by zero.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn trip_duration_stats(dataset: &TripDataset) -> Option<DurationStats> {
    if dataset.is_empty() {
        return None;
    }
    let total: f64 = dataset.trips.iter().map(|t| t.duration_secs).sum();
    let count = dataset.len();

    Some(DurationStats {
        trip_count: count,
        total_secs: total,
        mean_secs: total / count as f64,
    })
}
