//! Storefront Domain Concerns

pub mod carts;
pub mod coupons;
pub mod orders;
pub mod products;
