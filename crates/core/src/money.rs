//! Money arithmetic helpers.
//!
//! All currency amounts are `rust_decimal::Decimal` internally; the wire
//! carries binary floats rendered with two decimal places. Keeping the
//! arithmetic in fixed-point avoids cumulative rounding drift across the
//! repeated recomputation the reconciliation invariants require.

use rust_decimal::Decimal;

/// Display/settlement scale: two decimal places.
pub const DISPLAY_SCALE: u32 = 2;

/// Tolerance under which an invoice counts as fully paid (one cent).
pub fn settlement_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Round an amount to the display scale (banker's rounding is deliberately
/// not used; amounts round half away from zero like the upstream store).
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        DISPLAY_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Line total for an integral quantity.
pub fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
    round_amount(Decimal::from(quantity) * unit_price)
}

/// Line total for a decimal quantity (invoice lines allow fractional
/// quantities, e.g. hours or weights).
pub fn decimal_line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    round_amount(quantity * unit_price)
}

/// Tax amount for a percent rate applied to a subtotal.
pub fn tax_amount(sub_total: Decimal, tax_rate_percent: Decimal) -> Decimal {
    round_amount(sub_total * tax_rate_percent / Decimal::from(100))
}

/// Render an amount the way the wire and the UI show it: two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_amount(amount))
}
