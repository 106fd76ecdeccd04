use crate::analyzers::types::{BirthYearStats, CategoryCounts, Demographic, UserStats};
use crate::analyzers::utility::{mode, value_counts};
use crate::loader::{TripDataset, TripRecord};

/// User type counts plus gender and birth-year figures where the city's
/// file carries those columns.
#[tracing::instrument(skip_all, fields(trips = dataset.len()))]
pub fn user_stats(dataset: &TripDataset) -> UserStats {
    let trips = &dataset.trips;

    let gender = if dataset.columns.gender {
        let counts = category_counts(trips, |t| t.gender.as_deref());
        if counts.counts.is_empty() {
            Demographic::NoData
        } else {
            Demographic::Known(counts)
        }
    } else {
        Demographic::Unavailable
    };

    let birth_year = if dataset.columns.birth_year {
        birth_year_stats(trips)
            .map(Demographic::Known)
            .unwrap_or(Demographic::NoData)
    } else {
        Demographic::Unavailable
    };

    UserStats {
        user_types: category_counts(trips, |t| t.user_type.as_deref()),
        gender,
        birth_year,
    }
}

/// Counts a categorical field, treating blank cells separately.
pub fn category_counts<F>(trips: &[TripRecord], field: F) -> CategoryCounts
where
    F: Fn(&TripRecord) -> Option<&str>,
{
    let values: Vec<&str> = trips.iter().filter_map(&field).collect();
    CategoryCounts {
        blank: trips.len() - values.len(),
        counts: value_counts(values),
    }
}

fn birth_year_stats(trips: &[TripRecord]) -> Option<BirthYearStats> {
    let years: Vec<i32> = trips.iter().filter_map(|t| t.birth_year).collect();
    Some(BirthYearStats {
        earliest: *years.iter().min()?,
        most_recent: *years.iter().max()?,
        most_common: mode(years.iter().copied())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::City;
    use crate::loader::read_trips;

    const HEADER: &str =
        "Start Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year\n";

    fn dataset(body: &str) -> TripDataset {
        read_trips(format!("{HEADER}{body}").as_bytes(), City::Chicago, "test").unwrap()
    }

    #[test]
    fn test_user_type_counts_sum_to_row_count() {
        let ds = dataset(
            "2017-01-01 10:00:00,60,A,B,Subscriber,Male,1980\n\
             2017-01-01 10:00:00,60,A,B,Customer,Female,1990\n\
             2017-01-01 10:00:00,60,A,B,Subscriber,Male,1990\n\
             2017-01-01 10:00:00,60,A,B,,,\n",
        );
        let stats = user_stats(&ds);
        assert_eq!(
            stats.user_types.counts,
            vec![("Subscriber".to_string(), 2), ("Customer".to_string(), 1)]
        );
        assert_eq!(stats.user_types.blank, 1);
        assert_eq!(stats.user_types.total(), ds.len());

        let gender = stats.gender.known().unwrap();
        assert_eq!(gender.counts[0], ("Male".to_string(), 2));
        assert_eq!(gender.total(), ds.len());

        assert_eq!(
            stats.birth_year,
            Demographic::Known(BirthYearStats {
                earliest: 1980,
                most_recent: 1990,
                most_common: 1990,
            })
        );
    }

    #[test]
    fn test_missing_columns_are_unavailable() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-01-01 10:00:00,60,A,B,Customer\n";
        let ds = read_trips(csv.as_bytes(), City::Washington, "test").unwrap();
        let stats = user_stats(&ds);
        assert_eq!(stats.gender, Demographic::Unavailable);
        assert_eq!(stats.birth_year, Demographic::Unavailable);
        assert!(!stats.gender.is_available());
    }

    #[test]
    fn test_non_finite_birth_years_are_ignored() {
        let ds = dataset(
            "2017-01-01 10:00:00,60,A,B,Subscriber,Male,1985.0\n\
             2017-01-01 10:00:00,60,A,B,Subscriber,Male,NaN\n\
             2017-01-01 10:00:00,60,A,B,Subscriber,Male,inf\n",
        );
        assert_eq!(
            user_stats(&ds).birth_year,
            Demographic::Known(BirthYearStats {
                earliest: 1985,
                most_recent: 1985,
                most_common: 1985,
            })
        );
    }

    #[test]
    fn test_present_but_blank_columns_have_no_data() {
        let ds = dataset("2017-01-01 10:00:00,60,A,B,Customer,,\n");
        let stats = user_stats(&ds);
        assert_eq!(stats.gender, Demographic::NoData);
        assert_eq!(stats.birth_year, Demographic::NoData);
        assert!(stats.gender.is_available());
    }
}
