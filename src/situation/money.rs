//! Money math for work situations.
//!
//! Every figure that leaves this module is rounded to two decimal places,
//! midpoint away from zero. Row values are rounded before they are summed,
//! so a subtotal is always the sum of the values printed on the rows.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::model::WorkItem;

/// VAT applied to the subtotal (21%).
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

const DECIMAL_PLACES: u32 = 2;

/// Rounds a value to two decimal places, 0.005 going away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Value of a row for the current month.
///
/// A disabled factor is replaced by 1, so an enabled factor means
/// "participates in the product", not "is non-zero". A row with no enabled
/// factor is worth nothing regardless of its figures.
pub fn compute_row_value(item: &WorkItem) -> Decimal {
    let flags = item.factors;
    if !flags.any() {
        return Decimal::ZERO;
    }

    let pick = |enabled: bool, value: Decimal| if enabled { value } else { Decimal::ONE };

    let product = pick(flags.include_total_quantity, item.total_quantity)
        * pick(flags.include_monthly_quantity, item.quantity_this_month)
        * pick(flags.include_rate, item.rate);

    round2(product)
}

/// Aggregate figures of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
    /// Always equal to `grand_total`; partial payments are not tracked.
    pub amount_due: Decimal,
}

/// Derives subtotal, VAT, grand total and amount due from a row set.
pub fn compute_totals(items: &[WorkItem]) -> Totals {
    let subtotal = round2(items.iter().map(|item| item.value_this_month).sum());
    let tax = round2(subtotal * VAT_RATE);
    let grand_total = round2(subtotal + tax);

    Totals {
        subtotal,
        tax,
        grand_total,
        amount_due: grand_total,
    }
}
