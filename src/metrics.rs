use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;
use crate::terms::periodic_rate;

/// Summary figures reduced from a finished schedule.
///
/// Computed once by [`DerivedMetrics::from_schedule`] and never updated. Sums
/// saturate at the decimal range instead of overflowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub total_interest: Decimal,
    /// Sum of principal portions, contributions included.
    pub total_principal: Decimal,
    pub total_paid: Decimal,
    pub total_extra: Decimal,
    /// `total_paid / periods_used`, zero for an empty schedule.
    pub average_payment: Decimal,
    pub periods_used: u32,
    /// Nominal term minus the periods actually used, never negative.
    pub periods_saved: u32,
    /// Rough estimate only; see [`estimate_interest_saved`].
    pub estimated_interest_saved: Decimal,
}

impl DerivedMetrics {
    pub fn from_schedule(
        schedule: &Schedule,
        term_periods: u32,
        annual_rate_percent: Decimal,
    ) -> Self {
        let mut total_interest = Decimal::ZERO;
        let mut total_principal = Decimal::ZERO;
        let mut total_paid = Decimal::ZERO;
        let mut total_extra = Decimal::ZERO;

        for record in &schedule.records {
            total_interest = total_interest.saturating_add(record.interest);
            total_principal = total_principal.saturating_add(record.amortization);
            total_paid = total_paid.saturating_add(record.total_payment);
            total_extra = total_extra.saturating_add(record.extra_contribution);
        }

        let periods_used = schedule.records.len() as u32;
        let average_payment = if periods_used == 0 {
            Decimal::ZERO
        } else {
            total_paid / Decimal::from(periods_used)
        };

        DerivedMetrics {
            total_interest,
            total_principal,
            total_paid,
            total_extra,
            average_payment,
            periods_used,
            periods_saved: periods_saved(term_periods, periods_used),
            estimated_interest_saved: estimate_interest_saved(total_extra, annual_rate_percent),
        }
    }
}

/// Periods saved against the nominal term. An empty schedule saves nothing.
pub fn periods_saved(term_periods: u32, periods_used: u32) -> u32 {
    if periods_used == 0 {
        return 0;
    }
    term_periods.saturating_sub(periods_used)
}

/// Heuristic interest saving attributed to extra contributions.
///
/// This is `total_extra * periodic_rate * 0.5`, a quick approximation and not
/// the difference against a contribution-free schedule. Treat it as
/// indicative only.
pub fn estimate_interest_saved(total_extra: Decimal, annual_rate_percent: Decimal) -> Decimal {
    if total_extra <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_extra
        .saturating_mul(periodic_rate(annual_rate_percent.max(Decimal::ZERO)))
        .saturating_mul(dec!(0.5))
}
