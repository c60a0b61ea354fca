//! Fixed-payment (annuity) loan arithmetic.
//!
//! All computation is done in `Decimal` so that a payment stored at
//! submission time and a payment recomputed later from the same frozen
//! inputs are bit-identical. The monthly rate is derived at 10 decimal
//! places and the payment is settled at 2, both rounded half-up, matching
//! the cooperative's ledger conventions.

use rust_decimal::{Decimal, RoundingStrategy};

const RATE_SCALE: u32 = 10;
const PAYMENT_SCALE: u32 = 2;

/// Monthly payment for an amortizing loan of `principal` over
/// `term_months` at `annual_rate_percent` (e.g. `12.5` for 12.5% annual).
///
/// A zero rate degenerates to straight-line repayment. `term_months` must
/// be positive; passing zero is a caller bug.
pub fn monthly_payment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Decimal {
    assert!(term_months > 0, "term_months must be positive");

    let term = Decimal::from(term_months);
    let monthly_rate = (annual_rate_percent / Decimal::from(1200u32))
        .round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);

    if monthly_rate.is_zero() {
        return (principal / term)
            .round_dp_with_strategy(PAYMENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    }

    let growth = compound(Decimal::ONE + monthly_rate, term_months);
    let numerator = principal * monthly_rate * growth;
    let denominator = growth - Decimal::ONE;

    (numerator / denominator)
        .round_dp_with_strategy(PAYMENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Interest paid over the life of the loan given its settled monthly
/// payment.
pub fn total_interest(principal: Decimal, monthly_payment: Decimal, term_months: u32) -> Decimal {
    monthly_payment * Decimal::from(term_months) - principal
}

/// `base^exponent` by repeated multiplication. Avoids float `powf` so the
/// result stays reproducible across platforms.
fn compound(base: Decimal, exponent: u32) -> Decimal {
    let mut acc = Decimal::ONE;
    for _ in 0..exponent {
        acc *= base;
    }
    acc
}
