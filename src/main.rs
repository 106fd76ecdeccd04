//! Interactive entry point for the bikeshare explorer.
//!
//! Asks for a city and optional month/day filters, prints trip statistics and
//! charts for the matching trips, offers raw rows page by page, and starts
//! over for as long as the user wants to.

use anyhow::Result;
use bikeshare_explorer::{
    analyzers::analyzer::analyze,
    charts::{ChartSet, render::render_all},
    loader::load_data,
    output::{print_pretty, render_report, report_json},
    prompt::Prompter,
};
use clap::Parser;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_explorer")]
#[command(about = "Explore US bikeshare trip data interactively", long_about = None)]
struct Cli {
    /// Directory holding chicago.csv, new_york_city.csv and washington.csv
    #[arg(short, long, env = "BIKESHARE_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Also print each statistics report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Skip the text charts
    #[arg(long, default_value_t = false)]
    no_charts: bool,

    /// Raw rows shown per page
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..))]
    page_size: u16,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_explorer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_explorer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    // stderr stays quiet by default so it doesn't interleave with the prompts
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("warn".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    info!(data_dir = %cli.data_dir.display(), json = cli.json, no_charts = cli.no_charts, "Starting");

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let mut cycle = 0u32;
    loop {
        cycle += 1;
        let span = info_span!("cycle", cycle);
        let _enter = span.enter();

        let selection = prompter.get_filters()?;
        info!(%selection, "Filters selected");

        let dataset = load_data(&cli.data_dir, &selection)?;
        let report = analyze(&dataset, &selection);
        print_pretty(&report);

        prompter.say(&render_report(&report))?;
        if cli.json {
            prompter.say(&report_json(&report)?)?;
            prompter.say("\n")?;
        }

        if !cli.no_charts && !dataset.is_empty() {
            let charts = ChartSet::build(&dataset);
            prompter.say("\n")?;
            prompter.say(&render_all(&charts))?;
        }

        let shown = prompter.page_rows(&dataset, usize::from(cli.page_size))?;
        info!(shown, "Raw rows shown");

        if !prompter.confirm("\nWould you like to restart? Enter yes or no.\n")? {
            break;
        }
    }

    info!(cycles = cycle, "Finished");
    Ok(())
}
