use log::warn;
use rust_decimal::{Decimal, MathematicalOps};

use crate::terms::periodic_rate;

/// Calculates the fixed periodic payment of the French (level-payment) method.
///
/// The formula is: PMT = P * [i(1 + i)^n] / [(1 + i)^n – 1]
///
/// When the periodic rate is zero (or negative), or when the annuity formula
/// overflows or degenerates, the straight-line estimate `P / n` is returned
/// instead. A term of zero periods yields a zero payment.
///
/// # Arguments
///
/// * `principal` - The financed amount.
/// * `annual_rate_percent` - The annual interest rate as a percentage (e.g., 12 for 12%).
/// * `term_periods` - The total number of monthly payments.
pub fn compute_level_payment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_periods: u32,
) -> Decimal {
    if term_periods == 0 {
        return Decimal::ZERO;
    }

    let straight_line = principal / Decimal::from(term_periods);
    let rate = periodic_rate(annual_rate_percent);
    if rate <= Decimal::ZERO {
        return straight_line;
    }

    match annuity_payment(principal, rate, term_periods) {
        Some(payment) => payment,
        None => {
            warn!(
                "annuity formula degenerate for rate {rate} over {term_periods} periods; \
                 using straight-line payment"
            );
            straight_line
        }
    }
}

/// Level payment for a strictly positive periodic rate, `None` on overflow or
/// a vanishing denominator.
fn annuity_payment(principal: Decimal, rate: Decimal, term_periods: u32) -> Option<Decimal> {
    let growth = (Decimal::ONE + rate).checked_powu(u64::from(term_periods))?;
    let denominator = growth.checked_sub(Decimal::ONE)?;
    if denominator <= Decimal::ZERO {
        return None;
    }

    let factor = rate.checked_mul(growth)?.checked_div(denominator)?;
    principal.checked_mul(factor)
}
