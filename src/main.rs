//! Amortization table CLI
//!
//! Builds a loan schedule from command-line flags or a JSON terms file and
//! prints it as JSON, a table or CSV. Set `RUST_LOG=debug` for engine logs.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use log::debug;
use rust_decimal::Decimal;
use serde_json::json;
use tabled::{Table, builder::Builder};

use amortization_table::report::{self, Report, ReportEntry, format_money};
use amortization_table::{
    AmortizationMethod, AmortizationResult, ContributionMode, ContributionPolicy, LoanTerms,
    calculate_amortization, config,
};

/// Generate loan amortization tables
#[derive(Parser)]
#[command(name = "amortize", version, about = "Generate loan amortization tables")]
struct Cli {
    /// Read loan terms from a JSON file instead of the flags below
    #[arg(long)]
    input: Option<PathBuf>,

    /// Purchase price
    #[arg(long, default_value = "100000")]
    price: Decimal,

    /// Down payment
    #[arg(long, default_value = "20000")]
    down_payment: Decimal,

    /// Annual interest rate in percent
    #[arg(long, default_value = "12")]
    rate: Decimal,

    /// Number of monthly periods
    #[arg(long, default_value_t = 36)]
    periods: u32,

    /// Amortization method
    #[arg(long, value_enum, default_value = "french")]
    method: MethodArg,

    /// Extra principal contribution per active period
    #[arg(long)]
    extra: Option<Decimal>,

    /// First period receiving the extra contribution
    #[arg(long, default_value_t = 1)]
    extra_start: u32,

    /// When extra contributions are applied
    #[arg(long, value_enum, default_value = "until-end")]
    extra_mode: ModeArg,

    /// Consecutive periods for the fixed-count mode
    #[arg(long)]
    extra_count: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Also write the CSV sheets (schedule, summary, contribution impact) here
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    French,
    German,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Once,
    UntilEnd,
    FixedCount,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
    Csv,
}

impl Cli {
    fn loan_terms(&self) -> Result<LoanTerms> {
        if let Some(path) = &self.input {
            return config::load_terms(path)
                .with_context(|| format!("failed to load terms from {}", path.display()));
        }

        let method = match self.method {
            MethodArg::French => AmortizationMethod::French,
            MethodArg::German => AmortizationMethod::German,
        };
        let mode = match self.extra_mode {
            ModeArg::Once => ContributionMode::Once,
            ModeArg::UntilEnd => ContributionMode::UntilEnd,
            ModeArg::FixedCount => ContributionMode::FixedCount,
        };
        let contribution = self.extra.map(|amount| ContributionPolicy {
            amount,
            start_period: self.extra_start,
            mode,
            count: self.extra_count,
        });

        Ok(LoanTerms {
            purchase_price: self.price,
            down_payment: self.down_payment,
            annual_rate_percent: self.rate,
            term_periods: self.periods,
            method,
            contribution,
        })
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let terms = cli.loan_terms()?;
    debug!("terms: {terms:?}");

    let result = calculate_amortization(terms).context("cannot build the amortization table")?;
    let report = Report::new(&result, Local::now().naive_local());

    match cli.output {
        OutputFormat::Json => print_json(&result, &report)?,
        OutputFormat::Table => print_tables(&result, &report),
        OutputFormat::Csv => report::write_schedule_csv(io::stdout().lock(), &result.schedule)?,
    }

    if let Some(dir) = &cli.export_dir {
        let written = report::export_csv(dir, &result, &report)
            .with_context(|| format!("failed to export to {}", dir.display()))?;
        for path in written {
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}

fn print_json(result: &AmortizationResult, report: &Report) -> Result<()> {
    let value = json!({
        "terms": result.terms,
        "metrics": result.metrics,
        "schedule": result.schedule.records,
        "cumulative": result.schedule.cumulative_totals(),
        "summary": report.summary,
        "contribution_impact": report.impact,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_tables(result: &AmortizationResult, report: &Report) {
    let mut builder = Builder::default();
    builder.push_record([
        "Period",
        "Opening balance",
        "Total payment",
        "Interest",
        "Amortization",
        "Extra",
        "Closing balance",
    ]);
    for r in &result.schedule.records {
        builder.push_record([
            r.period.to_string(),
            format_money(r.opening_balance),
            format_money(r.total_payment),
            format_money(r.interest),
            format_money(r.amortization),
            format_money(r.extra_contribution),
            format_money(r.closing_balance),
        ]);
    }
    println!("{}", Table::from(builder));

    println!("\nSummary:");
    println!("{}", entries_table(&report.summary));

    if let Some(impact) = &report.impact {
        println!("\nContribution impact:");
        println!("{}", entries_table(&impact.entries()));
    }
}

fn entries_table(entries: &[ReportEntry]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for entry in entries {
        builder.push_record([entry.label.as_str(), entry.value.as_str()]);
    }
    Table::from(builder)
}
