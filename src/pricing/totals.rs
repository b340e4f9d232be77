//! Cart aggregation and order total finalisation.

use serde::{Deserialize, Serialize};

/// The price snapshot a cart line carries into aggregation.
///
/// Both prices are in minor units and were resolved when the line was added
/// to the cart; they do not track later catalog edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// Undiscounted unit price at snapshot time.
    pub base_price: u64,

    /// Effective unit price at snapshot time.
    pub unit_price: u64,

    /// Units of the product in the cart.
    pub quantity: u32,
}

/// Totals derived from the cart lines alone, before any coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of effective line totals.
    pub subtotal: u64,

    /// How much the product-level discounts saved, already folded into the
    /// subtotal. Informational only.
    pub product_discount_savings: u64,
}

/// Sums effective line totals and product-discount savings over the cart.
///
/// An empty cart yields zero for both.
#[must_use]
pub fn aggregate(lines: &[PricedLine]) -> CartTotals {
    lines.iter().fold(CartTotals::default(), |totals, line| {
        let quantity = u64::from(line.quantity);
        let saving = line.base_price.saturating_sub(line.unit_price);

        CartTotals {
            subtotal: totals
                .subtotal
                .saturating_add(line.unit_price.saturating_mul(quantity)),
            product_discount_savings: totals
                .product_discount_savings
                .saturating_add(saving.saturating_mul(quantity)),
        }
    })
}

/// Combines the subtotal and coupon discount into the payable total,
/// clamped at zero.
#[must_use]
pub fn finalize(subtotal: u64, coupon_discount: u64) -> u64 {
    subtotal.saturating_sub(coupon_discount)
}
