//! Output-boundary rounding for monetary values.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places carried by every monetary output field.
pub const MONEY_SCALE: u32 = 2;

/// Round a full-precision sum for output. Call once, at the DTO boundary.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
