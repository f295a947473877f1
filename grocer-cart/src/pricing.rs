use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;

/// Flat delivery fee added to every checkout
pub const DEFAULT_DELIVERY_FEE: Decimal = dec!(5);

/// Loyalty points granted per currency unit spent
pub const POINTS_PER_UNIT: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of quantities, not number of lines
    pub count: u32,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub grand_total: Decimal,
}

/// Totals view over the current cart. Recomputed on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSnapshot {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

/// Saturates instead of panicking; `Cart` keeps its own lines inside the checked range.
pub fn totals_for(lines: &[CartLine], delivery_fee: Decimal) -> CartTotals {
    let count = lines
        .iter()
        .fold(0u32, |acc, line| acc.saturating_add(line.quantity));
    let subtotal = lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| {
            acc.saturating_add(line.unit_price.saturating_mul(Decimal::from(line.quantity)))
        });

    CartTotals {
        count,
        subtotal,
        delivery_fee,
        grand_total: subtotal.saturating_add(delivery_fee),
    }
}

/// Sum of quantities, `None` once it leaves `u32`
pub fn checked_count(lines: &[CartLine]) -> Option<u32> {
    lines
        .iter()
        .try_fold(0u32, |acc, line| acc.checked_add(line.quantity))
}

/// Grand total, `None` if any line total or the sum leaves `Decimal`'s range
pub fn checked_grand_total(lines: &[CartLine], delivery_fee: Decimal) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.checked_total()?))?
        .checked_add(delivery_fee)
}

/// round(unit_price * 10) * quantity
pub fn line_points(unit_price: Decimal, quantity: u32) -> u64 {
    let per_unit = match unit_price.checked_mul(POINTS_PER_UNIT) {
        Some(scaled) => scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .unwrap_or(u64::MAX),
        None => u64::MAX,
    };

    per_unit.saturating_mul(u64::from(quantity))
}

pub fn points_for(lines: &[CartLine]) -> u64 {
    lines
        .iter()
        .map(|line| line_points(line.unit_price, line.quantity))
        .fold(0u64, u64::saturating_add)
}
