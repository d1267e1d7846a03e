//! `amortization_table` is a Rust library for building loan amortization schedules.
//!
//! It supports the two classic amortization systems:
//! - **French (level payment)**: the total payment is fixed, the interest portion
//!   shrinks and the principal portion grows over time.
//! - **German (constant amortization)**: the principal portion is fixed, leading to
//!   decreasing total payments over time.
//!
//! Both can be combined with extra principal contributions (a single one, one per
//! period until the loan is repaid, or a fixed number of consecutive periods). The
//! schedule ends early once the balance reaches zero.
//!
//! ## Usage
//!
//! ```rust
//! use amortization_table::{calculate_amortization, AmortizationMethod, ContributionPolicy, LoanTerms};
//! use rust_decimal_macros::dec;
//!
//! let terms = LoanTerms {
//!     purchase_price: dec!(100_000),
//!     down_payment: dec!(20_000),
//!     annual_rate_percent: dec!(12),
//!     term_periods: 36,
//!     method: AmortizationMethod::French,
//!     contribution: Some(ContributionPolicy::once(dec!(5_000), 1)),
//! };
//!
//! match calculate_amortization(terms) {
//!     Ok(result) => {
//!         println!("Periods used:   {}", result.metrics.periods_used);
//!         println!("Total interest: {:.2}", result.metrics.total_interest);
//!         println!("Total paid:     {:.2}", result.metrics.total_paid);
//!     }
//!     Err(e) => {
//!         eprintln!("Error calculating amortization: {}", e);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod payment;
pub mod report;
pub mod schedule;
pub mod terms;

use serde::{Deserialize, Serialize};

pub use error::AmortizationError;
pub use metrics::DerivedMetrics;
pub use payment::compute_level_payment;
pub use schedule::{PeriodRecord, Schedule, simulate};
pub use terms::{
    AmortizationMethod, ContributionMode, ContributionPolicy, ContributionWindow, LoanTerms,
};

/// A computed schedule together with its summary metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// The terms the schedule was built from.
    pub terms: LoanTerms,
    pub schedule: Schedule,
    pub metrics: DerivedMetrics,
}

/// Validates the terms, simulates the schedule and derives its metrics.
///
/// This is the main entry point of the library.
///
/// # Errors
///
/// Returns [`AmortizationError::InvalidInput`] when the terms fail
/// [`LoanTerms::validate`], e.g. a down payment covering the whole price or a
/// zero-period term. Callers that prefer the engine's lenient behavior can
/// call [`simulate`] directly, which yields an empty schedule instead.
pub fn calculate_amortization(terms: LoanTerms) -> Result<AmortizationResult, AmortizationError> {
    terms.validate()?;
    Ok(amortize(terms))
}

/// Runs the engine without validation.
pub fn amortize(terms: LoanTerms) -> AmortizationResult {
    let schedule = simulate(&terms);
    let metrics =
        DerivedMetrics::from_schedule(&schedule, terms.term_periods, terms.annual_rate_percent);

    AmortizationResult {
        terms,
        schedule,
        metrics,
    }
}
