//! Period-by-period simulation of a loan.
//!
//! [`simulate`] walks periods `1..=term_periods`, splits each payment into
//! interest and principal according to the amortization method, applies the
//! extra-contribution policy and stops as soon as the balance reaches zero.
//! Records are appended in order and never revised afterwards.

use log::{debug, trace, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::payment::compute_level_payment;
use crate::terms::{AmortizationMethod, LoanTerms};

/// Positive balances at or below this amount are treated as repaid.
///
/// Decimal division leaves residues in the last digits (80,000 / 36 does not
/// terminate); they are folded into the period that produced them.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.000000001);

/// Payment details for a single period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    /// 1-indexed period number.
    pub period: u32,
    /// Balance owed at the start of the period.
    pub opening_balance: Decimal,
    /// Everything paid in the period: interest, principal and any contribution.
    pub total_payment: Decimal,
    /// The portion of the payment that covers interest.
    pub interest: Decimal,
    /// The portion that reduces the balance, contribution included.
    pub amortization: Decimal,
    /// Extra contribution scheduled for the period.
    pub extra_contribution: Decimal,
    /// Balance owed after the payment.
    pub closing_balance: Decimal,
}

/// Running totals up to and including a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeTotals {
    pub period: u32,
    pub interest: Decimal,
    pub amortization: Decimal,
}

/// The ordered sequence of period records of one loan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// The financed amount the schedule repays.
    pub principal: Decimal,
    pub records: Vec<PeriodRecord>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn first_payment(&self) -> Option<Decimal> {
        self.records.first().map(|r| r.total_payment)
    }

    pub fn last_payment(&self) -> Option<Decimal> {
        self.records.last().map(|r| r.total_payment)
    }

    /// Balance left after the last simulated period; zero for an empty schedule.
    pub fn final_balance(&self) -> Decimal {
        self.records
            .last()
            .map(|r| r.closing_balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether the simulated horizon repays the loan completely.
    pub fn is_repaid(&self) -> bool {
        !self.is_empty() && self.final_balance().is_zero()
    }

    /// Accumulated interest and principal per period, in period order.
    pub fn cumulative_totals(&self) -> Vec<CumulativeTotals> {
        let mut interest = Decimal::ZERO;
        let mut amortization = Decimal::ZERO;

        self.records
            .iter()
            .map(|r| {
                interest = interest.saturating_add(r.interest);
                amortization = amortization.saturating_add(r.amortization);
                CumulativeTotals {
                    period: r.period,
                    interest,
                    amortization,
                }
            })
            .collect()
    }
}

/// Upper bound on the records reserved up front; longer schedules grow on demand.
const MAX_RESERVED_PERIODS: u32 = 1200;

/// Amounts of one period before it becomes a [`PeriodRecord`].
struct PeriodStep {
    interest: Decimal,
    total_payment: Decimal,
    amortization: Decimal,
    closing_balance: Decimal,
}

/// Splits one period's payment. `None` when an amount leaves the decimal range.
fn settle_period(
    method: AmortizationMethod,
    balance: Decimal,
    rate: Decimal,
    level_payment: Decimal,
    constant_amortization: Decimal,
    extra_contribution: Decimal,
) -> Option<PeriodStep> {
    let interest = balance.checked_mul(rate)?;

    let (mut amortization, mut total_payment) = match method {
        AmortizationMethod::German => (
            constant_amortization,
            constant_amortization.checked_add(interest)?,
        ),
        AmortizationMethod::French => {
            ((level_payment - interest).max(Decimal::ZERO), level_payment)
        }
    };

    if extra_contribution > Decimal::ZERO {
        total_payment = total_payment.checked_add(extra_contribution)?;
        amortization = amortization.checked_add(extra_contribution)?;
    }

    if amortization > balance {
        amortization = balance;
        total_payment = interest.checked_add(amortization)?;
    }

    let mut closing_balance = (balance - amortization).max(Decimal::ZERO);
    if closing_balance > Decimal::ZERO && closing_balance <= BALANCE_TOLERANCE {
        total_payment = total_payment.checked_add(closing_balance)?;
        amortization = balance;
        closing_balance = Decimal::ZERO;
    }

    Some(PeriodStep {
        interest,
        total_payment,
        amortization,
        closing_balance,
    })
}

/// Builds the amortization schedule for the given terms.
///
/// A non-positive principal or a zero term produces an empty schedule with a
/// zero principal; no error is raised. Out-of-range contribution settings are
/// clamped (see [`ContributionPolicy::resolve`](crate::ContributionPolicy::resolve)).
/// If an amount would leave the decimal range the schedule ends at the last
/// period that could be computed.
pub fn simulate(terms: &LoanTerms) -> Schedule {
    let principal = terms.principal();
    let term_periods = terms.term_periods;
    if principal <= Decimal::ZERO || term_periods == 0 {
        debug!("empty schedule: principal {principal}, {term_periods} periods");
        return Schedule::default();
    }

    let rate = terms.periodic_rate();
    let window = terms.contribution_window();
    let level_payment = compute_level_payment(
        principal,
        terms.annual_rate_percent.max(Decimal::ZERO),
        term_periods,
    );
    let constant_amortization = principal / Decimal::from(term_periods);

    let mut balance = principal;
    let mut records = Vec::with_capacity(term_periods.min(MAX_RESERVED_PERIODS) as usize);

    for period in 1..=term_periods {
        let extra_contribution = window.amount_for(period);
        let Some(step) = settle_period(
            terms.method,
            balance,
            rate,
            level_payment,
            constant_amortization,
            extra_contribution,
        ) else {
            warn!("period {period}: amounts overflow the decimal range; ending schedule");
            break;
        };
        let PeriodStep {
            interest,
            total_payment,
            amortization,
            closing_balance,
        } = step;

        trace!(
            "period {period}: opening {balance}, interest {interest}, amortization {amortization}, \
             extra {extra_contribution}, closing {closing_balance}"
        );

        records.push(PeriodRecord {
            period,
            opening_balance: balance,
            total_payment,
            interest,
            amortization,
            extra_contribution,
            closing_balance,
        });

        balance = closing_balance;
        if balance <= Decimal::ZERO {
            break;
        }
    }

    debug!(
        "{} schedule: principal {principal}, {} of {term_periods} periods, final balance {balance}",
        terms.method,
        records.len()
    );

    Schedule { principal, records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terms::ContributionPolicy;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn base_terms(method: AmortizationMethod) -> LoanTerms {
        LoanTerms {
            purchase_price: dec!(100000),
            down_payment: dec!(20000),
            annual_rate_percent: dec!(12),
            term_periods: 36,
            method,
            contribution: None,
        }
    }

    #[test]
    fn test_french_first_period_split() {
        let schedule = simulate(&base_terms(AmortizationMethod::French));
        let first = &schedule.records[0];

        assert_eq!(schedule.principal, dec!(80000));
        assert_eq!(first.period, 1);
        assert_eq!(first.opening_balance, dec!(80000));
        assert_eq!(first.interest, dec!(800));
        assert_eq!(first.total_payment.round_dp(2), dec!(2657.14));
        assert_eq!(first.amortization.round_dp(2), dec!(1857.14));
        assert_eq!(first.closing_balance.round_dp(2), dec!(78142.86));
        assert_eq!(first.extra_contribution, dec!(0));
    }

    #[test]
    fn test_german_small_loan_matches_hand_computation() {
        let terms = LoanTerms {
            purchase_price: dec!(12000),
            down_payment: dec!(0),
            annual_rate_percent: dec!(12),
            term_periods: 12,
            method: AmortizationMethod::German,
            contribution: None,
        };
        let schedule = simulate(&terms);

        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule.first_payment(), Some(dec!(1120)));
        assert_eq!(schedule.last_payment(), Some(dec!(1010)));
        assert!(schedule.records.iter().all(|r| r.amortization == dec!(1000)));
        assert_eq!(schedule.final_balance(), dec!(0));
    }

    #[rstest]
    #[case(AmortizationMethod::French)]
    #[case(AmortizationMethod::German)]
    fn test_balances_chain_between_periods(#[case] method: AmortizationMethod) {
        let schedule = simulate(&base_terms(method));
        for pair in schedule.records.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
            assert_eq!(pair[0].period + 1, pair[1].period);
        }
        for r in &schedule.records {
            assert_eq!(r.closing_balance, r.opening_balance - r.amortization);
            assert_eq!(r.interest, r.opening_balance * dec!(0.01));
        }
    }

    #[rstest]
    #[case(AmortizationMethod::French)]
    #[case(AmortizationMethod::German)]
    fn test_full_term_repays_exactly(#[case] method: AmortizationMethod) {
        let schedule = simulate(&base_terms(method));
        let repaid: Decimal = schedule.records.iter().map(|r| r.amortization).sum();

        assert_eq!(schedule.len(), 36);
        assert!(schedule.is_repaid());
        assert!((repaid - dec!(80000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let mut terms = base_terms(AmortizationMethod::French);
        terms.annual_rate_percent = dec!(0);
        let schedule = simulate(&terms);

        assert_eq!(schedule.len(), 36);
        assert!(schedule.records.iter().all(|r| r.interest.is_zero()));
        assert_eq!(schedule.first_payment().map(|p| p.round_dp(2)), Some(dec!(2222.22)));
        assert!(schedule.is_repaid());
    }

    #[test]
    fn test_oversized_contribution_is_clamped_to_balance() {
        let mut terms = base_terms(AmortizationMethod::French);
        terms.contribution = Some(ContributionPolicy::once(dec!(100000), 1));
        let schedule = simulate(&terms);

        assert_eq!(schedule.len(), 1);
        let only = &schedule.records[0];
        assert_eq!(only.amortization, dec!(80000));
        assert_eq!(only.total_payment, dec!(80800));
        assert_eq!(only.extra_contribution, dec!(100000));
        assert_eq!(only.closing_balance, dec!(0));
    }

    #[test]
    fn test_contribution_before_start_is_not_applied() {
        let mut terms = base_terms(AmortizationMethod::German);
        terms.contribution = Some(ContributionPolicy::fixed_count(dec!(1000), 3, 6));
        let schedule = simulate(&terms);

        let applied: Vec<u32> = schedule
            .records
            .iter()
            .filter(|r| r.extra_contribution > dec!(0))
            .map(|r| r.period)
            .collect();
        assert_eq!(applied, vec![3, 4, 5, 6, 7, 8]);
    }

    #[rstest]
    #[case(dec!(100000), dec!(100000), 36)]
    #[case(dec!(100000), dec!(150000), 36)]
    #[case(dec!(100000), dec!(20000), 0)]
    fn test_degenerate_inputs_give_empty_schedule(
        #[case] price: Decimal,
        #[case] down: Decimal,
        #[case] periods: u32,
    ) {
        let mut terms = base_terms(AmortizationMethod::French);
        terms.purchase_price = price;
        terms.down_payment = down;
        terms.term_periods = periods;
        let schedule = simulate(&terms);

        assert!(schedule.is_empty());
        assert_eq!(schedule.principal, dec!(0));
        assert!(!schedule.is_repaid());
    }

    #[test]
    fn test_huge_term_ends_when_contribution_repays() {
        let terms = LoanTerms {
            purchase_price: dec!(1000),
            down_payment: dec!(0),
            annual_rate_percent: dec!(12),
            term_periods: u32::MAX,
            method: AmortizationMethod::French,
            contribution: Some(ContributionPolicy::once(dec!(5000), 1)),
        };
        let schedule = simulate(&terms);

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.records[0].amortization, dec!(1000));
        assert!(schedule.is_repaid());
    }

    #[test]
    fn test_out_of_range_interest_ends_schedule() {
        let terms = LoanTerms {
            purchase_price: dec!(50000000000000000000000000000),
            down_payment: dec!(0),
            annual_rate_percent: dec!(2400),
            term_periods: 12,
            method: AmortizationMethod::German,
            contribution: None,
        };
        let schedule = simulate(&terms);

        assert!(schedule.len() < 12);
        assert!(!schedule.is_repaid());
        assert_eq!(schedule.principal, dec!(50000000000000000000000000000));

        let metrics = crate::DerivedMetrics::from_schedule(&schedule, 12, dec!(2400));
        assert_eq!(metrics.periods_used as usize, schedule.len());
    }

    #[test]
    fn test_payment_below_interest_leaves_loan_outstanding() {
        // 1.5^240 leaves the decimal range, so the payment falls back to 80,000 / 240.
        let mut terms = base_terms(AmortizationMethod::French);
        terms.annual_rate_percent = dec!(600);
        terms.term_periods = 240;
        let schedule = simulate(&terms);

        assert_eq!(schedule.len(), 240);
        assert!(!schedule.is_repaid());
        assert!(schedule.final_balance() > dec!(0));
        assert!(schedule.records.iter().all(|r| r.amortization >= dec!(0)));
        assert!(schedule.records.iter().all(|r| r.closing_balance >= dec!(0)));
        assert_eq!(schedule.records[0].interest, dec!(40000));
    }

    #[test]
    fn test_cumulative_totals_accumulate() {
        let schedule = simulate(&base_terms(AmortizationMethod::German));
        let totals = schedule.cumulative_totals();

        assert_eq!(totals.len(), schedule.len());
        assert_eq!(totals[0].interest, dec!(800));
        let last = totals.last().unwrap();
        assert_eq!(last.period, 36);
        assert_eq!(last.interest.round_dp(2), dec!(14800.00));
        assert!((last.amortization - dec!(80000)).abs() < dec!(0.000001));
    }
}
