use crate::analyzers::types::StationStats;
use crate::analyzers::utility::mode;
use crate::loader::TripDataset;

/// Most used start station, end station and (start, end) combination.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn station_stats(dataset: &TripDataset) -> Option<StationStats> {
    let trips = &dataset.trips;
    let start = mode(trips.iter().map(|t| t.start_station.as_str()))?;
    let end = mode(trips.iter().map(|t| t.end_station.as_str()))?;
    let (from, to) = mode(
        trips
            .iter()
            .map(|t| (t.start_station.as_str(), t.end_station.as_str())),
    )?;

    Some(StationStats {
        most_common_start: start.to_string(),
        most_common_end: end.to_string(),
        most_common_trip: (from.to_string(), to.to_string()),
    })
}
