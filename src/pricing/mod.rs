//! Pricing & Discount Calculator
//!
//! The pure core of the engine: product discount resolution, cart
//! aggregation, coupon validation, and order total finalisation. Everything
//! here is a side-effect-free function of its inputs; time is always an
//! explicit [`jiff::Timestamp`] parameter.

pub mod coupons;
pub mod discounts;
pub mod totals;

pub use coupons::{CouponError, CouponRules, coupon_discount};
pub use discounts::{DiscountKind, InvalidDiscount, ProductDiscount, resolve_unit_price};
pub use totals::{CartTotals, PricedLine, aggregate, finalize};
