//! Terminal text rendering for [`ChartSet`](super::ChartSet).

use chrono::Month;
use std::fmt::Write;

use super::{BoxSummary, ChartSet, HistogramBin, PieSlice, ViolinSummary};
use crate::analyzers::types::Demographic;
use crate::output::not_available;

const BAR_WIDTH: usize = 40;
const AXIS_WIDTH: usize = 50;
const LINE_HEIGHT: usize = 8;
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Draws all six charts, one after another.
pub fn render_all(charts: &ChartSet) -> String {
    [
        render_histogram(&charts.duration_histogram),
        render_bars("User Types Distribution", &charts.user_types),
        render_monthly_line(&charts.monthly_counts),
        render_boxes(&charts.duration_boxes),
        render_violins(&charts.duration_violins),
        render_pie(&charts.gender_pie),
    ]
    .join("\n")
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * width as f64).round() as usize;
    "█".repeat(len.min(width))
}

pub fn render_histogram(bins: &[HistogramBin]) -> String {
    let mut out = String::from("Trip Duration Distribution (seconds)\n");
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    for b in bins {
        let _ = writeln!(
            out,
            "{:>10.1} - {:<10.1} | {:<width$} {}",
            b.lower,
            b.upper,
            bar(b.count as f64, max, BAR_WIDTH),
            b.count,
            width = BAR_WIDTH
        );
    }
    if bins.is_empty() {
        out.push_str("  (no trips)\n");
    }
    out
}

pub fn render_bars(title: &str, counts: &[(String, usize)]) -> String {
    let mut out = format!("{title}\n");
    let label_width = counts.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
    for (label, count) in counts {
        let _ = writeln!(
            out,
            "{:<label_width$} | {} {}",
            label,
            bar(*count as f64, max, BAR_WIDTH),
            count
        );
    }
    if counts.is_empty() {
        out.push_str("  (no trips)\n");
    }
    out
}

/// Trip counts per month plotted as points on a small grid, highest row first.
pub fn render_monthly_line(counts: &[(u32, usize)]) -> String {
    let mut out = String::from("Trip Counts Over Months\n");
    if counts.is_empty() {
        out.push_str("  (no trips)\n");
        return out;
    }
    let max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
    let levels: Vec<usize> = counts
        .iter()
        .map(|(_, c)| ((*c as f64 / max) * (LINE_HEIGHT - 1) as f64).round() as usize)
        .collect();

    for row in (0..LINE_HEIGHT).rev() {
        let label = if row == LINE_HEIGHT - 1 {
            format!("{:>8}", max as usize)
        } else if row == 0 {
            format!("{:>8}", 0)
        } else {
            " ".repeat(8)
        };
        out.push_str(&label);
        out.push_str(" │");
        for level in &levels {
            out.push_str(if *level == row { "  ●  " } else { "     " });
        }
        out.push('\n');
    }

    out.push_str(&" ".repeat(9));
    out.push('└');
    out.push_str(&"─".repeat(5 * counts.len()));
    out.push('\n');
    out.push_str(&" ".repeat(10));
    for (month, _) in counts {
        let name = Month::try_from(*month as u8)
            .map(|m| m.name()[..3].to_string())
            .unwrap_or_else(|_| month.to_string());
        let _ = write!(out, " {name:<4}");
    }
    out.push('\n');
    out
}

fn axis_bounds<'a, I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

fn column(x: f64, lo: f64, hi: f64) -> usize {
    if hi <= lo {
        return 0;
    }
    (((x - lo) / (hi - lo)) * (AXIS_WIDTH - 1) as f64).round() as usize
}

/// Horizontal box plots on a shared duration axis. `○` marks the extreme
/// value on a side that has outliers.
pub fn render_boxes(boxes: &[BoxSummary]) -> String {
    let mut out = String::from("Trip Durations by User Type (seconds)\n");
    if boxes.is_empty() {
        out.push_str("  (no trips)\n");
        return out;
    }
    let (lo, hi) = axis_bounds(boxes.iter().flat_map(|b| [&b.min, &b.max]));
    let label_width = boxes.iter().map(|b| b.user_type.len()).max().unwrap_or(0);

    for b in boxes {
        let mut line = vec![' '; AXIS_WIDTH];
        for c in column(b.lower_whisker, lo, hi)..=column(b.upper_whisker, lo, hi) {
            line[c] = '─';
        }
        for c in column(b.q1, lo, hi)..=column(b.q3, lo, hi) {
            line[c] = '█';
        }
        line[column(b.median, lo, hi)] = '┃';
        if b.min < b.lower_whisker {
            line[column(b.min, lo, hi)] = '○';
        }
        if b.max > b.upper_whisker {
            line[column(b.max, lo, hi)] = '○';
        }
        let _ = writeln!(
            out,
            "{:<label_width$} |{}| median {:.1}, IQR {:.1}-{:.1}, {} outliers",
            b.user_type,
            line.into_iter().collect::<String>(),
            b.median,
            b.q1,
            b.q3,
            b.outliers
        );
    }
    let _ = writeln!(out, "{:<label_width$}  {:<.1}{:>width$.1}", "", lo, hi, width = AXIS_WIDTH - 2);
    out
}

pub fn render_violins(violins: &[ViolinSummary]) -> String {
    let mut out = String::from("Trip Durations by User Type (Violin Plot)\n");
    if violins.is_empty() {
        out.push_str("  (no trips)\n");
        return out;
    }
    let label_width = violins.iter().map(|v| v.user_type.len()).max().unwrap_or(0);

    for v in violins {
        let peak = v.density.iter().map(|p| p.density).fold(0.0, f64::max);
        let profile: String = v
            .density
            .iter()
            .map(|p| {
                let idx = ((p.density / peak) * (SHADES.len() - 1) as f64).round() as usize;
                SHADES[idx.min(SHADES.len() - 1)]
            })
            .collect();
        let range = match (v.density.first(), v.density.last()) {
            (Some(first), Some(last)) => format!("{:.1} .. {:.1}", first.value, last.value),
            _ => "no spread".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<label_width$} |{}| {} (Q1 {:.1}, median {:.1}, Q3 {:.1})",
            v.user_type, profile, range, v.q1, v.median, v.q3
        );
    }
    out
}

pub fn render_pie(pie: &Demographic<Vec<PieSlice>>) -> String {
    let mut out = String::from("Gender Distribution\n");
    match pie {
        Demographic::Unavailable => {
            out.push_str(&not_available("Gender"));
            out.push('\n');
        }
        Demographic::NoData => out.push_str("  (no gender recorded for these trips)\n"),
        Demographic::Known(slices) => {
            let label_width = slices.iter().map(|s| s.label.len()).max().unwrap_or(0);
            for s in slices {
                let _ = writeln!(
                    out,
                    "{:<label_width$} {:>5.1}% {}",
                    s.label,
                    s.percent,
                    bar(s.percent, 100.0, BAR_WIDTH)
                );
            }
        }
    }
    out
}
