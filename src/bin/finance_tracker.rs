//! finance-tracker CLI
//!
//! Usage:
//!   finance-tracker generate --output data/finance_data.csv
//!   finance-tracker clean --input data/finance_data.csv --output data/finance_data_cleaned.csv
//!   finance-tracker analyze --input data/finance_data.csv
//!   finance-tracker report --input data/finance_data.csv --output data/report.json

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use finance_tracker::{
    generate_transactions, read_transactions, write_aggregate_csv, write_cleaned_csv,
    write_report_json, write_transactions_csv, AnalysisOutput, DiagnosticSummary, FinanceTracker,
    PipelineConfig, ReportPayload,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "finance-tracker", version, about = "Clean a transaction log and derive monthly savings and expense ratios")]
struct Cli {
    /// JSON pipeline configuration (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a synthetic transaction log
    Generate {
        #[arg(long, default_value = "data/finance_data.csv")]
        output: PathBuf,

        /// RNG seed; the same seed always produces the same data
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Clean a transaction log and write the cleaned CSV
    Clean {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value = "data/finance_data_cleaned.csv")]
        output: PathBuf,
    },

    /// Print monthly aggregates, savings rate and expense ratios
    Analyze {
        #[arg(long)]
        input: PathBuf,
    },

    /// Write the dashboard payload consumed by the charting tool
    Report {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value = "data/report.json")]
        output: PathBuf,

        /// Also write the month x category table as CSV
        #[arg(long)]
        aggregate_csv: Option<PathBuf>,

        /// Also write the cleaned records as CSV
        #[arg(long)]
        cleaned_csv: Option<PathBuf>,
    },

    /// Print the JSON schema of the report payload
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Generate { output, seed } => {
            let records = generate_transactions(seed);
            write_transactions_csv(&records, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Synthetic data generated and saved to {}", output.display());
        }

        Command::Clean { input, output } => {
            let records = load(&input)?;
            let cleaned = FinanceTracker::clean(&records, &config)?;
            write_cleaned_csv(&cleaned.records, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            print_diagnostics(&cleaned.diagnostics);
            println!("Data cleaned and saved to {}", output.display());
        }

        Command::Analyze { input } => {
            let output = analyze(&input, &config)?;
            print_analysis(&output);
        }

        Command::Report {
            input,
            output,
            aggregate_csv,
            cleaned_csv,
        } => {
            let analysis = analyze(&input, &config)?;

            let payload = analysis.report(&config);
            write_report_json(&payload, &output)
                .with_context(|| format!("writing {}", output.display()))?;

            if let Some(path) = aggregate_csv {
                write_aggregate_csv(&analysis.aggregate, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(path) = cleaned_csv {
                write_cleaned_csv(&analysis.cleaned, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            print_diagnostics(&analysis.diagnostics);
            println!(
                "Report payload with {} traces saved to {}",
                payload.trace_count(),
                output.display()
            );
        }

        Command::Schema => {
            println!("{}", ReportPayload::schema_as_json()?);
        }
    }

    Ok(())
}

fn load(input: &Path) -> Result<Vec<finance_tracker::TransactionRecord>> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    read_transactions(input).with_context(|| format!("reading {}", input.display()))
}

fn analyze(input: &Path, config: &PipelineConfig) -> Result<AnalysisOutput> {
    let records = load(input)?;
    FinanceTracker::process(&records, config).context("analysis failed")
}

fn print_diagnostics(d: &DiagnosticSummary) {
    println!("Rows read:               {}", d.input_rows);
    println!("Dropped (invalid date):  {}", d.dropped_invalid_dates);
    println!("Dropped (no category):   {}", d.dropped_empty_categories);
    println!("Dropped (no amount):     {}", d.dropped_unimputable_amounts);
    println!("Imputed amounts:         {}", d.imputed_amounts);
    println!("Removed outliers:        {}", d.removed_outliers);
    println!("Cleaned rows:            {}", d.cleaned_rows);
}

fn print_analysis(output: &AnalysisOutput) {
    let categories: Vec<&str> = output.aggregate.categories().collect();

    println!("## Monthly totals\n");
    print!("{:<8}", "Month");
    for category in &categories {
        print!(" {:>14}", category);
    }
    println!();

    for month in output.aggregate.months() {
        print!("{:<8}", month.to_string());
        for category in &categories {
            match output.aggregate.get(month, category) {
                Some(value) => print!(" {:>14.2}", value),
                None => print!(" {:>14}", "-"),
            }
        }
        println!();
    }

    println!("\n## Savings rate (%)\n");
    for (month, rate) in &output.ratios.savings_rate {
        println!("{}  {:>7.2}", month, rate);
    }
    match output.summary.mean_savings_rate {
        Some(rate) => println!("Mean: {:.2}", rate),
        None => println!("Mean: undefined (no month has both income and savings)"),
    }

    println!("\n## Mean expense ratios (%)\n");
    for (category, ratio) in &output.summary.mean_expense_ratios {
        println!("{:<16} {:>7.2}", category, ratio);
    }

    println!();
    print_diagnostics(&output.diagnostics);
}
