//! Loan terms and the extra-contribution policy.
//!
//! These are the immutable inputs of the engine. They are built once from
//! validated input and never mutated; the simulator only reads them.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AmortizationError;

/// How each period's principal portion is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationMethod {
    /// Level payment: the total payment is constant, the principal portion grows.
    #[default]
    French,
    /// Constant amortization: the principal portion is constant, the payment shrinks.
    German,
}

impl fmt::Display for AmortizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmortizationMethod::French => write!(f, "French"),
            AmortizationMethod::German => write!(f, "German"),
        }
    }
}

/// When extra contributions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionMode {
    /// A single contribution at the start period.
    Once,
    /// Every period from the start period until the loan is repaid.
    UntilEnd,
    /// A fixed number of consecutive periods beginning at the start period.
    FixedCount,
}

impl fmt::Display for ContributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionMode::Once => write!(f, "Once"),
            ContributionMode::UntilEnd => write!(f, "Until end"),
            ContributionMode::FixedCount => write!(f, "Fixed count"),
        }
    }
}

/// Extra principal contributions on top of the scheduled payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPolicy {
    /// Amount applied in every period the policy is active.
    pub amount: Decimal,
    /// First period (1-indexed) that may receive a contribution.
    pub start_period: u32,
    pub mode: ContributionMode,
    /// Number of consecutive periods, only meaningful for `FixedCount`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl ContributionPolicy {
    pub fn once(amount: Decimal, period: u32) -> Self {
        ContributionPolicy {
            amount,
            start_period: period,
            mode: ContributionMode::Once,
            count: None,
        }
    }

    pub fn until_end(amount: Decimal, start_period: u32) -> Self {
        ContributionPolicy {
            amount,
            start_period,
            mode: ContributionMode::UntilEnd,
            count: None,
        }
    }

    pub fn fixed_count(amount: Decimal, start_period: u32, count: u32) -> Self {
        ContributionPolicy {
            amount,
            start_period,
            mode: ContributionMode::FixedCount,
            count: Some(count),
        }
    }

    /// Resolves the policy against a term length.
    ///
    /// The start period is clamped into `[1, term_periods]` and the count into
    /// `[1, term_periods - start + 1]`. `UntilEnd` defaults its count to the
    /// remaining periods; `FixedCount` without a count covers one period.
    pub fn resolve(&self, term_periods: u32) -> ContributionWindow {
        if term_periods == 0 {
            return ContributionWindow::none();
        }

        let start = self.start_period.clamp(1, term_periods);
        let remaining = term_periods - start + 1;
        let requested = match self.mode {
            ContributionMode::Once => 1,
            ContributionMode::UntilEnd => self.count.unwrap_or(remaining),
            ContributionMode::FixedCount => self.count.unwrap_or(1),
        };

        ContributionWindow {
            amount: self.amount.max(Decimal::ZERO),
            start,
            count: requested.clamp(1, remaining),
            mode: self.mode,
        }
    }
}

/// A contribution policy resolved against a concrete term length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionWindow {
    pub amount: Decimal,
    pub start: u32,
    pub count: u32,
    pub mode: ContributionMode,
}

impl ContributionWindow {
    /// A window that never contributes.
    pub fn none() -> Self {
        ContributionWindow {
            amount: Decimal::ZERO,
            start: 1,
            count: 0,
            mode: ContributionMode::Once,
        }
    }

    /// Extra contribution applied in `period` (1-indexed).
    pub fn amount_for(&self, period: u32) -> Decimal {
        if self.amount <= Decimal::ZERO || self.count == 0 || period < self.start {
            return Decimal::ZERO;
        }

        let active = match self.mode {
            ContributionMode::Once => period == self.start,
            ContributionMode::FixedCount => period - self.start < self.count,
            ContributionMode::UntilEnd => true,
        };

        if active { self.amount } else { Decimal::ZERO }
    }
}

/// Converts an annual percentage rate into its monthly decimal equivalent.
///
/// The rate is nominal: 12% per year is exactly 1% per month.
pub fn periodic_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / dec!(12) / dec!(100)
}

/// Input parameters of a single schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Purchase price of the financed asset.
    pub purchase_price: Decimal,
    /// Amount paid up front; the remainder is financed.
    pub down_payment: Decimal,
    /// Annual interest rate as a percentage (e.g., 12 for 12%).
    pub annual_rate_percent: Decimal,
    /// Nominal number of monthly periods.
    pub term_periods: u32,
    #[serde(default)]
    pub method: AmortizationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution: Option<ContributionPolicy>,
}

impl LoanTerms {
    /// Financed amount, `max(0, price - down payment)`.
    pub fn principal(&self) -> Decimal {
        (self.purchase_price - self.down_payment).max(Decimal::ZERO)
    }

    /// Monthly rate used by the simulator. Negative rates are treated as zero.
    pub fn periodic_rate(&self) -> Decimal {
        periodic_rate(self.annual_rate_percent.max(Decimal::ZERO))
    }

    pub fn contribution_window(&self) -> ContributionWindow {
        self.contribution
            .as_ref()
            .map(|policy| policy.resolve(self.term_periods))
            .unwrap_or_else(ContributionWindow::none)
    }

    /// Caller-side validation run before the engine.
    ///
    /// The engine clamps internally and never fails, but a caller presenting
    /// results to a user should reject these inputs with a message instead.
    pub fn validate(&self) -> Result<(), AmortizationError> {
        if self.purchase_price < Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "purchase_price",
                "must not be negative",
            ));
        }
        if self.down_payment < Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "down_payment",
                "must not be negative",
            ));
        }
        if self.down_payment > self.purchase_price {
            return Err(AmortizationError::invalid(
                "down_payment",
                "must not exceed the purchase price",
            ));
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "annual_rate_percent",
                "must not be negative",
            ));
        }
        if self.term_periods == 0 {
            return Err(AmortizationError::invalid(
                "term_periods",
                "must be at least 1",
            ));
        }
        if self.principal() <= Decimal::ZERO {
            return Err(AmortizationError::invalid(
                "down_payment",
                "loan amount must be greater than zero; lower the down payment or raise the price",
            ));
        }

        if let Some(policy) = &self.contribution {
            if policy.amount < Decimal::ZERO {
                return Err(AmortizationError::invalid(
                    "contribution.amount",
                    "must not be negative",
                ));
            }
            if policy.start_period == 0 || policy.start_period > self.term_periods {
                return Err(AmortizationError::invalid(
                    "contribution.start_period",
                    format!("must be between 1 and {}", self.term_periods),
                ));
            }
            if policy.mode == ContributionMode::FixedCount {
                let remaining = self.term_periods - policy.start_period + 1;
                match policy.count {
                    Some(count) if (1..=remaining).contains(&count) => {}
                    _ => {
                        return Err(AmortizationError::invalid(
                            "contribution.count",
                            format!("must be between 1 and {remaining}"),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
