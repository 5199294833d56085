use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sales_forecast::{
    aggregate, forecast_with, input, report, select_window_with, CombinedTimeline, GapPolicy,
    ModelKind, MonthlySeries, PipelineOptions, TargetYear, TimeAxis,
};

#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(about = "Forecast monthly sales from historical transaction records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print total sales per calendar month
    Monthly {
        #[arg(long, default_value = "historical_data.csv")]
        csv: PathBuf,
    },
    /// Print the two-year training window for a target year
    Window {
        #[arg(long, default_value = "historical_data.csv")]
        csv: PathBuf,
        #[arg(long, default_value = "2016")]
        year: TargetYear,
        #[arg(long, value_enum, default_value_t = GapPolicy::Passthrough, env = "SALES_FORECAST_GAP_POLICY")]
        gap_policy: GapPolicy,
    },
    /// Run the full pipeline and write the combined timeline
    Forecast {
        #[command(flatten)]
        scenario: Scenario,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown forecast report
    Report {
        #[command(flatten)]
        scenario: Scenario,
        #[arg(long, default_value = "forecast.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct Scenario {
    #[arg(long, default_value = "historical_data.csv")]
    csv: PathBuf,
    /// Forecasting model: linear or arima
    #[arg(long, default_value = "linear")]
    model: String,
    #[arg(long, default_value = "2016")]
    year: TargetYear,
    #[arg(long, value_enum, default_value_t = GapPolicy::Passthrough, env = "SALES_FORECAST_GAP_POLICY")]
    gap_policy: GapPolicy,
    #[arg(long, value_enum, default_value_t = TimeAxis::Ordinal, env = "SALES_FORECAST_TIME_AXIS")]
    time_axis: TimeAxis,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Markdown,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sales_forecast=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monthly { csv } => {
            let series = load_series(&csv)?;
            if series.is_empty() {
                println!("No sales records found in {}.", csv.display());
                return Ok(());
            }
            println!("Monthly sales totals:");
            for entry in series.iter() {
                println!("- {}: {:.2}", entry.month.format("%Y-%m"), entry.total_sales);
            }
        }
        Commands::Window {
            csv,
            year,
            gap_policy,
        } => {
            let series = load_series(&csv)?;
            let window = select_window_with(&series, year, gap_policy)?;
            println!(
                "Training window for {} ({} to {}), {} months:",
                year,
                window.start().format("%Y-%m"),
                window.end().format("%Y-%m"),
                window.len()
            );
            for entry in window.entries() {
                println!("- {}: {:.2}", entry.month.format("%Y-%m"), entry.total_sales);
            }
        }
        Commands::Forecast {
            scenario,
            format,
            out,
        } => {
            let (timeline, series) = run_scenario(&scenario)?;
            let rendered = match format {
                OutputFormat::Csv => report::to_csv(&timeline)?,
                OutputFormat::Json => report::to_json(&timeline)?,
                OutputFormat::Markdown => report::build_report(&timeline, &series),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Forecast written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Report { scenario, out } => {
            let (timeline, series) = run_scenario(&scenario)?;
            let report = report::build_report(&timeline, &series);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load_series(csv: &Path) -> anyhow::Result<MonthlySeries> {
    let records = input::read_records_from_path(csv)
        .with_context(|| format!("failed to load sales records from {}", csv.display()))?;
    Ok(aggregate(&records)?)
}

fn run_scenario(
    scenario: &Scenario,
) -> anyhow::Result<(CombinedTimeline, MonthlySeries)> {
    // Reject an unknown model before reading any input.
    let kind: ModelKind = scenario.model.parse()?;
    let options = PipelineOptions {
        gap_policy: scenario.gap_policy,
        time_axis: scenario.time_axis,
    };

    let series = load_series(&scenario.csv)?;
    let window = select_window_with(&series, scenario.year, options.gap_policy)?;
    let timeline = forecast_with(&window, kind, &series, scenario.year, &options)?;
    Ok((timeline, series))
}
