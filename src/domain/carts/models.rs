//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::{coupons::models::CouponCode, products::models::ProductUuid},
    pricing::PricedLine,
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Model
#[derive(Debug, Clone)]
pub struct Cart {
    pub uuid: CartUuid,
    pub lines: Vec<CartLine>,
    /// The applied coupon, stored as its code only; the discount amount is
    /// recomputed against the current subtotal on every read.
    pub coupon: Option<CouponCode>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    /// Returns the price snapshots for aggregation.
    #[must_use]
    pub fn priced_lines(&self) -> Vec<PricedLine> {
        self.lines
            .iter()
            .map(|line| PricedLine {
                base_price: line.base_price,
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect()
    }

    /// Returns whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// New Cart Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCart {
    pub uuid: CartUuid,
}

/// CartLine Model
///
/// Title and prices are snapshotted when the product is first added;
/// later catalog edits do not retroactively change the line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_uuid: ProductUuid,
    pub title: String,
    /// Undiscounted unit price at snapshot time, minor units.
    pub base_price: u64,
    /// Effective unit price at snapshot time, minor units.
    pub unit_price: u64,
    pub quantity: u32,
}

/// Totals for the cart as it currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    /// Sum of effective line totals.
    pub subtotal: u64,

    /// Savings from product-level discounts, already folded into the
    /// subtotal.
    pub product_discount_savings: u64,

    /// Additional reduction granted by the applied coupon, if any.
    pub coupon_discount: u64,

    /// The payable amount: subtotal less coupon discount, floored at zero.
    pub final_total: u64,
}
