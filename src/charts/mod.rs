//! Chart series derived from a filtered trip dataset.
//!
//! Six charts are produced: a trip-duration histogram, user-type bars, trip
//! counts per month, box and violin summaries of duration per user type, and
//! a gender pie. [`render`] draws them as terminal text.

pub mod render;

use serde::Serialize;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::analyzers::types::Demographic;
use crate::analyzers::users::category_counts;
use crate::analyzers::utility::{mean, quantile, stddev};
use crate::loader::TripDataset;

pub const HISTOGRAM_BINS: usize = 20;
pub const DENSITY_POINTS: usize = 32;

/// Violin density is evaluated this many bandwidths past the data range.
const DENSITY_CUT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary with Tukey whiskers for one user type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub user_type: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityPoint {
    pub value: f64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolinSummary {
    pub user_type: String,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub density: Vec<DensityPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// All chart series for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub duration_histogram: Vec<HistogramBin>,
    pub user_types: Vec<(String, usize)>,
    pub monthly_counts: Vec<(u32, usize)>,
    pub duration_boxes: Vec<BoxSummary>,
    pub duration_violins: Vec<ViolinSummary>,
    pub gender_pie: Demographic<Vec<PieSlice>>,
}

impl ChartSet {
    #[tracing::instrument(skip_all, fields(trips = dataset.len()))]
    pub fn build(dataset: &TripDataset) -> Self {
        Self {
            duration_histogram: duration_histogram(dataset, HISTOGRAM_BINS),
            user_types: category_counts(&dataset.trips, |t| t.user_type.as_deref()).counts,
            monthly_counts: monthly_trip_counts(dataset),
            duration_boxes: duration_box_plots(dataset),
            duration_violins: duration_violins(dataset, DENSITY_POINTS),
            gender_pie: gender_pie(dataset),
        }
    }
}

/// Equal-width histogram of trip durations over the observed range. The last
/// bin includes its upper edge. A single distinct value gets a unit-wide range.
pub fn duration_histogram(dataset: &TripDataset, bins: usize) -> Vec<HistogramBin> {
    let durations: Vec<f64> = dataset.trips.iter().map(|t| t.duration_secs).collect();
    if durations.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = durations.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for d in durations {
        let idx = (((d - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Trips per calendar month, ascending by month.
pub fn monthly_trip_counts(dataset: &TripDataset) -> Vec<(u32, usize)> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for t in &dataset.trips {
        *counts.entry(t.month()).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Sorted durations per user type, keyed by user type name. Trips without a
/// user type are left out.
fn durations_by_user_type(dataset: &TripDataset) -> BTreeMap<&str, Vec<f64>> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for t in &dataset.trips {
        if let Some(user_type) = t.user_type.as_deref() {
            groups.entry(user_type).or_default().push(t.duration_secs);
        }
    }
    for durations in groups.values_mut() {
        durations.sort_by(f64::total_cmp);
    }
    groups
}

pub fn duration_box_plots(dataset: &TripDataset) -> Vec<BoxSummary> {
    durations_by_user_type(dataset)
        .into_iter()
        .filter_map(|(user_type, sorted)| box_summary(user_type, &sorted))
        .collect()
}

fn box_summary(user_type: &str, sorted: &[f64]) -> Option<BoxSummary> {
    let q1 = quantile(sorted, 0.25)?;
    let median = quantile(sorted, 0.5)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    let (fence_lo, fence_hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|d| *d >= fence_lo && *d <= fence_hi)
        .collect();

    Some(BoxSummary {
        user_type: user_type.to_string(),
        min: *sorted.first()?,
        q1,
        median,
        q3,
        max: *sorted.last()?,
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers: sorted.len() - inside.len(),
    })
}

pub fn duration_violins(dataset: &TripDataset, points: usize) -> Vec<ViolinSummary> {
    durations_by_user_type(dataset)
        .into_iter()
        .filter_map(|(user_type, sorted)| {
            Some(ViolinSummary {
                user_type: user_type.to_string(),
                q1: quantile(&sorted, 0.25)?,
                median: quantile(&sorted, 0.5)?,
                q3: quantile(&sorted, 0.75)?,
                density: kernel_density(&sorted, points),
            })
        })
        .collect()
}

/// Gaussian kernel density estimate using Scott's rule for the bandwidth.
/// Empty when the values have no spread.
pub fn kernel_density(values: &[f64], points: usize) -> Vec<DensityPoint> {
    let n = values.len();
    let bandwidth = stddev(values, mean(values)) * (n as f64).powf(-0.2);
    if bandwidth <= 0.0 || points < 2 {
        return Vec::new();
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min) - DENSITY_CUT * bandwidth;
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + DENSITY_CUT * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum();
            DensityPoint {
                value: x,
                density: sum * norm,
            }
        })
        .collect()
}

/// Share of each gender among trips that record one.
pub fn gender_pie(dataset: &TripDataset) -> Demographic<Vec<PieSlice>> {
    if !dataset.columns.gender {
        return Demographic::Unavailable;
    }
    let counts = category_counts(&dataset.trips, |t| t.gender.as_deref()).counts;
    let known: usize = counts.iter().map(|(_, c)| c).sum();
    if known == 0 {
        return Demographic::NoData;
    }

    Demographic::Known(
        counts
            .into_iter()
            .map(|(label, count)| PieSlice {
                label,
                count,
                percent: count as f64 * 100.0 / known as f64,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::City;
    use crate::loader::read_trips;

    fn dataset(body: &str) -> TripDataset {
        let csv = format!(
            "Start Time,Trip Duration,Start Station,End Station,User Type,Gender\n{body}"
        );
        read_trips(csv.as_bytes(), City::Chicago, "test").unwrap()
    }

    fn sample() -> TripDataset {
        dataset(
            "2017-01-01 10:00:00,100,A,B,Subscriber,Male\n\
             2017-01-02 10:00:00,200,A,B,Subscriber,Female\n\
             2017-03-01 10:00:00,300,A,B,Subscriber,Male\n\
             2017-03-02 10:00:00,400,A,B,Subscriber,Male\n\
             2017-06-01 10:00:00,5000,A,B,Customer,\n",
        )
    }

    #[test]
    fn test_histogram_covers_every_trip() {
        let bins = duration_histogram(&sample(), HISTOGRAM_BINS);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[0].lower, 100.0);
        assert_eq!(bins[HISTOGRAM_BINS - 1].upper, 5000.0);
        // the maximum lands in the closed last bin
        assert_eq!(bins[HISTOGRAM_BINS - 1].count, 1);
        // width is 245s: 100, 200 and 300 share the first bin
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[1].count, 1);
    }

    #[test]
    fn test_histogram_single_value() {
        let ds = dataset("2017-01-01 10:00:00,60,A,B,Customer,\n");
        let bins = duration_histogram(&ds, 4);
        assert_eq!(bins[0].lower, 59.5);
        assert_eq!(bins[3].upper, 60.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);
    }

    #[test]
    fn test_histogram_empty() {
        assert!(duration_histogram(&dataset(""), HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_monthly_counts_ascending() {
        assert_eq!(monthly_trip_counts(&sample()), vec![(1, 2), (3, 2), (6, 1)]);
    }

    #[test]
    fn test_box_summary_with_outlier() {
        let ds = dataset(
            "2017-01-01 10:00:00,10,A,B,Subscriber,\n\
             2017-01-01 10:00:00,20,A,B,Subscriber,\n\
             2017-01-01 10:00:00,30,A,B,Subscriber,\n\
             2017-01-01 10:00:00,40,A,B,Subscriber,\n\
             2017-01-01 10:00:00,1000,A,B,Subscriber,\n",
        );
        let boxes = duration_box_plots(&ds);
        assert_eq!(boxes.len(), 1);
        let b = &boxes[0];
        assert_eq!(b.q1, 20.0);
        assert_eq!(b.median, 30.0);
        assert_eq!(b.q3, 40.0);
        assert_eq!(b.lower_whisker, 10.0);
        assert_eq!(b.upper_whisker, 40.0);
        assert_eq!(b.max, 1000.0);
        assert_eq!(b.outliers, 1);
    }

    #[test]
    fn test_groups_are_ordered_by_user_type() {
        let boxes = duration_box_plots(&sample());
        let names: Vec<&str> = boxes.iter().map(|b| b.user_type.as_str()).collect();
        assert_eq!(names, vec!["Customer", "Subscriber"]);
    }

    #[test]
    fn test_kernel_density_integrates_to_about_one() {
        let values = [100.0, 200.0, 300.0, 400.0];
        let density = kernel_density(&values, 200);
        let step = density[1].value - density[0].value;
        let area: f64 = density.iter().map(|p| p.density * step).sum();
        assert!((area - 1.0).abs() < 0.05, "area was {area}");
    }

    #[test]
    fn test_kernel_density_without_spread_is_empty() {
        assert!(kernel_density(&[5.0, 5.0], DENSITY_POINTS).is_empty());
        assert!(kernel_density(&[5.0], DENSITY_POINTS).is_empty());
    }

    #[test]
    fn test_gender_pie_percentages() {
        let Demographic::Known(slices) = gender_pie(&sample()) else {
            panic!("expected gender slices");
        };
        assert_eq!(slices[0].label, "Male");
        assert_eq!(slices[0].count, 3);
        assert_eq!(slices[0].percent, 75.0);
        let total: f64 = slices.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_gender_pie_unavailable_without_column() {
        let csv = "Start Time,Trip Duration,Start Station,End Station,User Type\n\
                   2017-01-01 10:00:00,60,A,B,Customer\n";
        let ds = read_trips(csv.as_bytes(), City::Washington, "test").unwrap();
        assert_eq!(gender_pie(&ds), Demographic::Unavailable);
    }
}
