//! Till
//!
//! Till is the pricing, discount and checkout totals engine for a storefront.
//! It resolves per-product discounts into effective unit prices, aggregates
//! cart totals, validates coupon codes against redemption rules, and freezes
//! order totals at checkout.

pub mod domain;
pub mod pricing;

mod uuids;

pub use uuids::TypedUuid;
