use std::time::Instant;
use tracing::{debug, info};

use crate::analyzers::duration::trip_duration_stats;
use crate::analyzers::stations::station_stats;
use crate::analyzers::time::time_stats;
use crate::analyzers::types::{PassTimings, StatisticsReport};
use crate::analyzers::users::user_stats;
use crate::filters::FilterSelection;
use crate::loader::TripDataset;

/// Runs every statistics pass over a filtered dataset and collects the results
/// into one report, timing each pass.
#[tracing::instrument(skip_all, fields(city = %dataset.city, trips = dataset.len()))]
pub fn analyze(dataset: &TripDataset, selection: &FilterSelection) -> StatisticsReport {
    let mut timings = PassTimings::default();

    let started = Instant::now();
    let time = time_stats(dataset);
    timings.time = started.elapsed().as_secs_f64();

    let started = Instant::now();
    let stations = station_stats(dataset);
    timings.stations = started.elapsed().as_secs_f64();

    let started = Instant::now();
    let duration = trip_duration_stats(dataset);
    timings.duration = started.elapsed().as_secs_f64();

    let started = Instant::now();
    let users = user_stats(dataset);
    timings.users = started.elapsed().as_secs_f64();

    debug!(?timings, "Passes finished");
    if dataset.is_empty() {
        info!("No trips matched the selection");
    }

    StatisticsReport {
        city: dataset.city,
        month: selection.month.to_string(),
        day: selection.day.to_string(),
        trip_count: dataset.len(),
        time,
        stations,
        duration,
        users,
        timings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Demographic;
    use crate::filters::{City, DayFilter, MonthFilter};
    use crate::loader::read_trips;

    #[test]
    fn test_empty_dataset_report() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type,Gender\n";
        let ds = read_trips(csv.as_bytes(), City::Chicago, "test").unwrap();
        let selection = FilterSelection::new(
            City::Chicago,
            "may".parse::<MonthFilter>().unwrap(),
            DayFilter::All,
        );
        let report = analyze(&ds, &selection);

        assert_eq!(report.trip_count, 0);
        assert_eq!(report.month, "may");
        assert!(report.time.is_none());
        assert!(report.stations.is_none());
        assert!(report.duration.is_none());
        assert_eq!(report.users.user_types.total(), 0);
        assert_eq!(report.users.gender, Demographic::NoData);
        assert_eq!(report.users.birth_year, Demographic::Unavailable);
    }

    #[test]
    fn test_report_city_comes_from_dataset() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-04-03 12:00:00,90,A,B,Customer\n";
        let ds = read_trips(csv.as_bytes(), City::NewYorkCity, "test").unwrap();
        let report = analyze(&ds, &FilterSelection::everything(City::NewYorkCity));
        assert_eq!(report.city, ds.city);
        assert_eq!(report.city, City::NewYorkCity);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-04-03 12:00:00,90,A,B,Customer\n";
        let ds = read_trips(csv.as_bytes(), City::Washington, "test").unwrap();
        let report = analyze(&ds, &FilterSelection::everything(City::Washington));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["city"], "washington");
        assert_eq!(json["trip_count"], 1);
        assert_eq!(json["time"]["most_common_day"], "Monday");
        assert_eq!(json["users"]["gender"]["status"], "unavailable");
    }
}
