//! CSV loader for per-city trip logs.
//!
//! Reads a city's file (plain or gzip-compressed), checks the header for the
//! required columns, detects which optional demographic columns the file
//! carries, and applies month/day filters to the parsed rows.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::filters::{City, DayFilter, FilterSelection, MonthFilter};

pub const START_TIME: &str = "Start Time";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

/// Columns every city file must provide.
pub const REQUIRED_COLUMNS: [&str; 5] =
    [START_TIME, TRIP_DURATION, START_STATION, END_STATION, USER_TYPE];

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A row as it appears in the file. Optional columns deserialize to `None`
/// when the header lacks them or the cell is blank.
#[derive(Debug, Deserialize)]
struct RawTrip {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "User Type", default)]
    user_type: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    #[serde(rename = "Birth Year", default, deserialize_with = "csv::invalid_option")]
    birth_year: Option<f64>,
}

/// One trip, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub duration_secs: f64,
    pub start_station: String,
    pub end_station: String,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
}

impl TripRecord {
    /// Calendar month of the start time, 1-12.
    pub fn month(&self) -> u32 {
        self.start_time.month()
    }

    pub fn weekday(&self) -> Weekday {
        self.start_time.weekday()
    }

    /// Hour of day of the start time, 0-23.
    pub fn hour(&self) -> u32 {
        self.start_time.hour()
    }

    fn from_raw(raw: RawTrip) -> Result<Self> {
        if raw.trip_duration < 0.0 || !raw.trip_duration.is_finite() {
            bail!("invalid trip duration {}", raw.trip_duration);
        }
        Ok(Self {
            start_time: parse_timestamp(&raw.start_time)?,
            duration_secs: raw.trip_duration,
            start_station: raw.start_station,
            end_station: raw.end_station,
            user_type: raw.user_type,
            gender: raw.gender,
            birth_year: raw.birth_year.and_then(birth_year_from_cell),
        })
    }
}

/// Whole year from a numeric cell such as `1992.0`. NaN, infinities and
/// values outside `i32` count as missing.
fn birth_year_from_cell(year: f64) -> Option<i32> {
    if !year.is_finite() {
        return None;
    }
    i32::try_from(year.round() as i64).ok()
}

/// Optional columns found in a file's header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSet {
    pub gender: bool,
    pub birth_year: bool,
}

/// The trips of one city that passed the current filters.
#[derive(Debug, Clone)]
pub struct TripDataset {
    pub city: City,
    pub columns: ColumnSet,
    pub trips: Vec<TripRecord>,
}

impl TripDataset {
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Keeps only trips starting in the filter's month.
    pub fn filter_month(mut self, month: MonthFilter) -> Self {
        if let Some(n) = month.number() {
            self.trips.retain(|t| t.month() == n);
        }
        self
    }

    /// Keeps only trips starting on the filter's weekday.
    pub fn filter_day(mut self, day: DayFilter) -> Self {
        if day != DayFilter::All {
            self.trips.retain(|t| day.matches(t.weekday()));
        }
        self
    }

    pub fn filter(self, month: MonthFilter, day: DayFilter) -> Self {
        self.filter_month(month).filter_day(day)
    }
}

/// Parses a start time cell into a naive local date-time.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .with_context(|| format!("unparseable timestamp '{s}'"))
}

/// Loads the selected city's file from `data_dir` and applies the selection's
/// month and day filters.
#[tracing::instrument(skip_all, fields(city = %selection.city, month = %selection.month, day = %selection.day))]
pub fn load_data(data_dir: &Path, selection: &FilterSelection) -> Result<TripDataset> {
    let dataset = load_city(data_dir, selection.city)?;
    let total = dataset.len();
    let filtered = dataset.filter(selection.month, selection.day);
    info!(total, kept = filtered.len(), "Trips filtered");
    Ok(filtered)
}

/// Loads every trip of `city` without filtering.
pub fn load_city(data_dir: &Path, city: City) -> Result<TripDataset> {
    let (path, reader) = open_city_file(data_dir, city)?;
    read_trips(reader, city, &path.display().to_string())
}

/// Opens `<dir>/<city>.csv`, falling back to `<dir>/<city>.csv.gz`.
pub fn open_city_file(data_dir: &Path, city: City) -> Result<(PathBuf, Box<dyn Read>)> {
    let plain = data_dir.join(city.file_name());
    if plain.exists() {
        debug!(path = %plain.display(), "Opening trip file");
        let file = File::open(&plain)
            .with_context(|| format!("failed to open {}", plain.display()))?;
        return Ok((plain, Box::new(file)));
    }

    let gz = data_dir.join(format!("{}.gz", city.file_name()));
    if gz.exists() {
        debug!(path = %gz.display(), "Opening gzip trip file");
        let file =
            File::open(&gz).with_context(|| format!("failed to open {}", gz.display()))?;
        return Ok((gz, Box::new(GzDecoder::new(file))));
    }

    bail!(
        "no trip data for {} in {} (expected {})",
        city,
        data_dir.display(),
        city.file_name()
    )
}

/// Reads a trip log from any reader. `source` names the input in errors.
pub fn read_trips<R: Read>(reader: R, city: City, source: &str) -> Result<TripDataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .with_context(|| format!("failed to read header of {source}"))?
        .clone();
    let has = |name: &str| headers.iter().any(|h| h == name);

    for column in REQUIRED_COLUMNS {
        if !has(column) {
            bail!("{source} is missing required column '{column}'");
        }
    }
    let columns = ColumnSet {
        gender: has(GENDER),
        birth_year: has(BIRTH_YEAR),
    };
    debug!(source, ?columns, "Header checked");

    let mut trips = Vec::new();
    for (i, result) in rdr.deserialize::<RawTrip>().enumerate() {
        // header is line 1
        let line = i + 2;
        let raw = result.with_context(|| format!("{source}: malformed row at line {line}"))?;
        let trip = TripRecord::from_raw(raw)
            .with_context(|| format!("{source}: bad value at line {line}"))?;
        trips.push(trip);
    }

    info!(source, rows = trips.len(), "Trip file loaded");
    Ok(TripDataset {
        city,
        columns,
        trips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Month;
    use std::env;
    use std::fs;
    use std::io::Write;

    const WITH_DEMOGRAPHICS: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1,2017-01-02 08:00:00,2017-01-02 08:10:00,600,A,B,Subscriber,Male,1980.0
2,2017-03-04 17:30:00,2017-03-04 17:40:00,600,B,C,Customer,,
3,2017-06-05 09:15:00,2017-06-05 09:20:00,300,A,C,Subscriber,Female,1992
";

    const WITHOUT_DEMOGRAPHICS: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type
1,2017-02-01 07:00:00,2017-02-01 07:05:00,300.5,X,Y,Subscriber
2,2017-02-02 07:00:00,2017-02-02 07:05:00,250.25,Y,X,Customer
";

    fn read(csv: &str) -> TripDataset {
        read_trips(csv.as_bytes(), City::Chicago, "test").unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2017-01-02 08:00:00").unwrap();
        let b = parse_timestamp("2017-01-02T08:00:00").unwrap();
        let c = parse_timestamp("2017-01-02 08:00:00.250").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 8);
        assert_eq!(c.second(), 0);
        assert!(parse_timestamp("02/01/2017").is_err());
    }

    #[test]
    fn test_read_detects_optional_columns() {
        let ds = read(WITH_DEMOGRAPHICS);
        assert_eq!(ds.len(), 3);
        assert!(ds.columns.gender);
        assert!(ds.columns.birth_year);

        let ds = read(WITHOUT_DEMOGRAPHICS);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns, ColumnSet::default());
        assert_eq!(ds.trips[0].gender, None);
        assert_eq!(ds.trips[0].birth_year, None);
    }

    #[test]
    fn test_blank_cells_become_none() {
        let ds = read(WITH_DEMOGRAPHICS);
        assert_eq!(ds.trips[0].gender.as_deref(), Some("Male"));
        assert_eq!(ds.trips[0].birth_year, Some(1980));
        assert_eq!(ds.trips[1].gender, None);
        assert_eq!(ds.trips[1].birth_year, None);
        assert_eq!(ds.trips[2].birth_year, Some(1992));
    }

    #[test]
    fn test_derived_fields() {
        let ds = read(WITH_DEMOGRAPHICS);
        let t = &ds.trips[1];
        assert_eq!(t.month(), 3);
        assert_eq!(t.weekday(), Weekday::Sat);
        assert_eq!(t.hour(), 17);
    }

    #[test]
    fn test_end_time_is_not_parsed() {
        let csv = "Start Time,End Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-06-23 15:09:32,6/23/2017 15:14,300,A,B,Customer\n";
        let ds = read_trips(csv.as_bytes(), City::Chicago, "test").unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.trips[0].month(), 6);
    }

    #[test]
    fn test_birth_year_from_cell() {
        assert_eq!(birth_year_from_cell(1992.0), Some(1992));
        assert_eq!(birth_year_from_cell(1979.6), Some(1980));
        assert_eq!(birth_year_from_cell(f64::NAN), None);
        assert_eq!(birth_year_from_cell(f64::INFINITY), None);
        assert_eq!(birth_year_from_cell(1e12), None);
    }

    #[test]
    fn test_fractional_durations() {
        let ds = read(WITHOUT_DEMOGRAPHICS);
        assert_eq!(ds.trips[0].duration_secs, 300.5);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let csv = "Start Time,Trip Duration,Start Station,End Station\n2017-01-01 00:00:00,1,A,B\n";
        let err = read_trips(csv.as_bytes(), City::Washington, "bad.csv").unwrap_err();
        assert!(err.to_string().contains("User Type"));
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\nyesterday,1,A,B,Customer\n";
        let err = read_trips(csv.as_bytes(), City::Washington, "bad.csv").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_filter_month_and_day() {
        let ds = read(WITH_DEMOGRAPHICS);
        let june = ds.clone().filter_month(MonthFilter::Only(Month::June));
        assert_eq!(june.len(), 1);
        assert!(june.trips.iter().all(|t| t.month() == 6));

        let monday = ds.clone().filter_day(DayFilter::Only(Weekday::Mon));
        assert_eq!(monday.len(), 2);

        let both = ds.filter(MonthFilter::Only(Month::June), DayFilter::Only(Weekday::Sat));
        assert!(both.is_empty());
    }

    #[test]
    fn test_load_data_from_plain_and_gzip_files() {
        let dir = env::temp_dir().join("bikeshare_explorer_loader_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        fs::write(dir.join("chicago.csv"), WITH_DEMOGRAPHICS).unwrap();

        let gz_path = dir.join("washington.csv.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            fs::File::create(&gz_path).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(WITHOUT_DEMOGRAPHICS.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let chicago = load_data(&dir, &FilterSelection::everything(City::Chicago)).unwrap();
        assert_eq!(chicago.len(), 3);

        let washington = load_data(&dir, &FilterSelection::everything(City::Washington)).unwrap();
        assert_eq!(washington.len(), 2);
        assert!(!washington.columns.gender);

        assert!(load_data(&dir, &FilterSelection::everything(City::NewYorkCity)).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
