//! Adapters for the presentation side: summary mapping, contribution impact
//! and CSV export.
//!
//! Nothing here computes amortization; everything reads an
//! [`AmortizationResult`]. The export writes one CSV file per "sheet":
//! the schedule, the summary, and the contribution impact (only when extra
//! contributions were made).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AmortizationResult;
use crate::error::AmortizationError;
use crate::schedule::{PeriodRecord, Schedule};

pub const SCHEDULE_FILE: &str = "amortization.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const IMPACT_FILE: &str = "contribution_impact.csv";

const NOT_APPLICABLE: &str = "Not applicable";

/// One line of a key/value report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub label: String,
    pub value: String,
}

impl ReportEntry {
    fn new(label: &str, value: impl Into<String>) -> Self {
        ReportEntry {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// How much the extra contributions changed the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionImpact {
    pub total_extra: Decimal,
    pub periods_with_extra: u32,
    pub estimated_interest_saved: Decimal,
    pub periods_saved: u32,
    pub average_payment: Decimal,
    /// Average payment with the contributions taken out.
    pub average_payment_without_extra: Decimal,
}

impl ContributionImpact {
    /// `None` when no contribution was made.
    pub fn from_result(result: &AmortizationResult) -> Option<Self> {
        let metrics = &result.metrics;
        if metrics.total_extra <= Decimal::ZERO || metrics.periods_used == 0 {
            return None;
        }

        let records = &result.schedule.records;
        let periods_with_extra = records
            .iter()
            .filter(|r| r.extra_contribution > Decimal::ZERO)
            .count() as u32;

        Some(ContributionImpact {
            total_extra: metrics.total_extra,
            periods_with_extra,
            estimated_interest_saved: metrics.estimated_interest_saved,
            periods_saved: metrics.periods_saved,
            average_payment: metrics.average_payment,
            average_payment_without_extra: (metrics.total_paid - metrics.total_extra)
                / Decimal::from(metrics.periods_used),
        })
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        vec![
            ReportEntry::new("Total extra contributions", format_money(self.total_extra)),
            ReportEntry::new(
                "Periods with contribution",
                period_count(self.periods_with_extra),
            ),
            ReportEntry::new(
                "Estimated interest saved",
                format_money(self.estimated_interest_saved),
            ),
            ReportEntry::new("Term reduction", period_count(self.periods_saved)),
            ReportEntry::new(
                "Average payment with contributions",
                format_money(self.average_payment),
            ),
            ReportEntry::new(
                "Estimated average payment without contributions",
                format_money(self.average_payment_without_extra),
            ),
        ]
    }
}

/// Everything a report consumer needs besides the schedule itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub summary: Vec<ReportEntry>,
    pub impact: Option<ContributionImpact>,
}

impl Report {
    /// `calculated_at` is stamped into the summary as given.
    pub fn new(result: &AmortizationResult, calculated_at: NaiveDateTime) -> Self {
        Report {
            summary: summary_entries(result, calculated_at),
            impact: ContributionImpact::from_result(result),
        }
    }
}

/// The free-form key/value summary of a computed loan.
pub fn summary_entries(result: &AmortizationResult, calculated_at: NaiveDateTime) -> Vec<ReportEntry> {
    let terms = &result.terms;
    let metrics = &result.metrics;
    let window = terms.contribution_window();

    let (extra, mode, start, periods) = match &terms.contribution {
        Some(policy) => (
            format_money(policy.amount),
            policy.mode.to_string(),
            format!("Period {}", window.start),
            period_count(window.count),
        ),
        None => (
            format_money(Decimal::ZERO),
            NOT_APPLICABLE.to_string(),
            NOT_APPLICABLE.to_string(),
            NOT_APPLICABLE.to_string(),
        ),
    };

    vec![
        ReportEntry::new("Purchase price", format_money(terms.purchase_price)),
        ReportEntry::new("Down payment", format_money(terms.down_payment)),
        ReportEntry::new("Loan amount", format_money(result.schedule.principal)),
        ReportEntry::new(
            "Annual interest rate",
            format!("{}%", terms.annual_rate_percent.normalize()),
        ),
        ReportEntry::new("Requested term", period_count(terms.term_periods)),
        ReportEntry::new("Actual term", period_count(metrics.periods_used)),
        ReportEntry::new("Periods saved", period_count(metrics.periods_saved)),
        ReportEntry::new("Amortization method", terms.method.to_string()),
        ReportEntry::new("Extra contribution", extra),
        ReportEntry::new("Contribution mode", mode),
        ReportEntry::new("Contribution start", start),
        ReportEntry::new("Contribution periods", periods),
        ReportEntry::new("Total interest", format_money(metrics.total_interest)),
        ReportEntry::new("Total principal", format_money(metrics.total_principal)),
        ReportEntry::new("Total contributions", format_money(metrics.total_extra)),
        ReportEntry::new("Total paid", format_money(metrics.total_paid)),
        ReportEntry::new("Average payment", format_money(metrics.average_payment)),
        ReportEntry::new(
            "Calculated at",
            calculated_at.format("%d/%m/%Y %H:%M:%S").to_string(),
        ),
    ]
}

/// Formats an amount as `$1,234.56`, rounded to cents.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{cents}")
}

/// `"1 period"`, `"36 periods"`.
pub fn period_count(n: u32) -> String {
    if n == 1 {
        "1 period".to_string()
    } else {
        format!("{n} periods")
    }
}

/// Rounds to cents and always keeps two decimal places.
fn cents(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}

fn rounded(record: &PeriodRecord) -> PeriodRecord {
    PeriodRecord {
        period: record.period,
        opening_balance: cents(record.opening_balance),
        total_payment: cents(record.total_payment),
        interest: cents(record.interest),
        amortization: cents(record.amortization),
        extra_contribution: cents(record.extra_contribution),
        closing_balance: cents(record.closing_balance),
    }
}

/// Writes the schedule as CSV, one row per period, amounts rounded to cents.
pub fn write_schedule_csv<W: io::Write>(writer: W, schedule: &Schedule) -> Result<(), AmortizationError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if schedule.is_empty() {
        wtr.write_record([
            "period",
            "opening_balance",
            "total_payment",
            "interest",
            "amortization",
            "extra_contribution",
            "closing_balance",
        ])?;
    }
    for record in &schedule.records {
        wtr.serialize(rounded(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a key/value section as a two-column CSV.
pub fn write_entries_csv<W: io::Write>(
    writer: W,
    header: [&str; 2],
    entries: &[ReportEntry],
) -> Result<(), AmortizationError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header)?;
    for entry in entries {
        wtr.write_record([entry.label.as_str(), entry.value.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the schedule, summary and (if any) contribution-impact sheets into
/// `dir`, creating it when missing. Returns the written paths.
pub fn export_csv(
    dir: impl AsRef<Path>,
    result: &AmortizationResult,
    report: &Report,
) -> Result<Vec<PathBuf>, AmortizationError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(3);

    let schedule_path = dir.join(SCHEDULE_FILE);
    write_schedule_csv(fs::File::create(&schedule_path)?, &result.schedule)?;
    written.push(schedule_path);

    let summary_path = dir.join(SUMMARY_FILE);
    write_entries_csv(fs::File::create(&summary_path)?, ["Concept", "Value"], &report.summary)?;
    written.push(summary_path);

    if let Some(impact) = &report.impact {
        let impact_path = dir.join(IMPACT_FILE);
        write_entries_csv(fs::File::create(&impact_path)?, ["Metric", "Value"], &impact.entries())?;
        written.push(impact_path);
    }

    info!("exported {} sheets to {}", written.len(), dir.display());
    Ok(written)
}
