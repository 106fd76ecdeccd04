//! Text and JSON presentation of statistics reports and raw trip rows.

use anyhow::Result;
use chrono::Month;
use std::fmt::Write;
use tracing::debug;

use crate::analyzers::types::{CategoryCounts, Demographic, StatisticsReport};
use crate::loader::TripDataset;

pub const SEPARATOR: &str = "----------------------------------------";

const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Red "not available" notice for a column the city's file lacks.
pub fn not_available(field: &str) -> String {
    format!("{RED}{field} data not available for this city.{RESET}")
}

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &StatisticsReport) {
    debug!("{:#?}", report);
}

/// Serializes the report as pretty-printed JSON.
pub fn report_json(report: &StatisticsReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn section_footer(out: &mut String, secs: f64) {
    let _ = writeln!(out, "\nThis took {secs:.6} seconds.");
    out.push_str(SEPARATOR);
    out.push('\n');
}

fn write_counts(out: &mut String, counts: &CategoryCounts) {
    for (value, count) in &counts.counts {
        let _ = writeln!(out, "{value}: {count}");
    }
    if counts.blank > 0 {
        let _ = writeln!(out, "(blank): {}", counts.blank);
    }
}

/// Renders every section of the report as terminal text.
pub fn render_report(report: &StatisticsReport) -> String {
    let mut out = String::new();

    if report.trip_count == 0 {
        let _ = writeln!(
            out,
            "\nNo matching trips for this selection (city={}, month={}, day={}).",
            report.city, report.month, report.day
        );
        out.push_str(SEPARATOR);
        out.push('\n');
        return out;
    }

    if let Some(time) = &report.time {
        out.push_str("\nCalculating The Most Frequent Times of Travel...\n\n");
        let month_name = Month::try_from(time.most_common_month as u8)
            .map(|m| m.name())
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "Most common month: {} ({month_name})",
            time.most_common_month
        );
        let _ = writeln!(out, "Most common day of the week: {}", time.most_common_day);
        let _ = writeln!(out, "Most common start hour: {:02}:00", time.most_common_hour);
        section_footer(&mut out, report.timings.time);
    }

    if let Some(stations) = &report.stations {
        out.push_str("\nCalculating The Most Popular Stations and Trip...\n\n");
        let _ = writeln!(
            out,
            "Most commonly used start station: {}",
            stations.most_common_start
        );
        let _ = writeln!(
            out,
            "Most commonly used end station: {}",
            stations.most_common_end
        );
        let (from, to) = &stations.most_common_trip;
        let _ = writeln!(
            out,
            "Most frequent combination of start and end station: {from} to {to}"
        );
        section_footer(&mut out, report.timings.stations);
    }

    if let Some(duration) = &report.duration {
        out.push_str("\nCalculating Trip Duration...\n\n");
        let _ = writeln!(out, "Total travel time: {} seconds", duration.total_secs);
        let _ = writeln!(out, "Mean travel time: {} seconds", duration.mean_secs);
        section_footer(&mut out, report.timings.duration);
    }

    out.push_str("\nCalculating User Stats...\n\n");
    out.push_str("Counts of user types:\n");
    write_counts(&mut out, &report.users.user_types);

    match &report.users.gender {
        Demographic::Known(counts) => {
            out.push_str("\nCounts of gender:\n");
            write_counts(&mut out, counts);
        }
        Demographic::NoData => out.push_str("\nNo gender recorded for these trips.\n"),
        Demographic::Unavailable => {
            let _ = writeln!(out, "\n{}", not_available("Gender"));
        }
    }

    match &report.users.birth_year {
        Demographic::Known(years) => {
            let _ = writeln!(out, "\nEarliest year of birth: {}", years.earliest);
            let _ = writeln!(out, "Most recent year of birth: {}", years.most_recent);
            let _ = writeln!(out, "Most common year of birth: {}", years.most_common);
        }
        Demographic::NoData => out.push_str("\nNo birth year recorded for these trips.\n"),
        Demographic::Unavailable => {
            let _ = writeln!(out, "\n{}", not_available("Birth Year"));
        }
    }
    section_footer(&mut out, report.timings.users);

    out
}

/// Renders trips `start..start + len` of the dataset as a table. Demographic
/// columns appear only when the city's file carries them.
pub fn render_rows(dataset: &TripDataset, start: usize, len: usize) -> String {
    let end = (start + len).min(dataset.len());
    let mut out = String::new();
    if start >= end {
        return out;
    }

    let _ = write!(
        out,
        "{:>6}  {:<19}  {:>10}  {:<30}  {:<30}  {:<10}",
        "#", "Start Time", "Duration", "Start Station", "End Station", "User Type"
    );
    if dataset.columns.gender {
        let _ = write!(out, "  {:<6}", "Gender");
    }
    if dataset.columns.birth_year {
        let _ = write!(out, "  {:>10}", "Birth Year");
    }
    out.push('\n');

    for (i, t) in dataset.trips[start..end].iter().enumerate() {
        let _ = write!(
            out,
            "{:>6}  {:<19}  {:>10.1}  {:<30}  {:<30}  {:<10}",
            start + i,
            t.start_time.format("%Y-%m-%d %H:%M:%S"),
            t.duration_secs,
            t.start_station,
            t.end_station,
            t.user_type.as_deref().unwrap_or("")
        );
        if dataset.columns.gender {
            let _ = write!(out, "  {:<6}", t.gender.as_deref().unwrap_or(""));
        }
        if dataset.columns.birth_year {
            let year = t.birth_year.map(|y| y.to_string()).unwrap_or_default();
            let _ = write!(out, "  {year:>10}");
        }
        out.push('\n');
    }
    out
}
