//! Coupon validation and discount computation.
//!
//! A coupon's redemption rules are checked in a fixed order so that a
//! coupon failing several checks always reports the same reason. The
//! computed discount is a function of the *current* subtotal; callers must
//! recompute it whenever the cart changes rather than reuse a stored
//! amount.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::discounts::{DiscountKind, InvalidDiscount, percent_of_minor};

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    /// No coupon exists under the normalised code.
    #[error("coupon not found")]
    NotFound,

    /// The coupon has been switched off.
    #[error("coupon is not active")]
    Inactive,

    /// The coupon's expiry date has passed.
    #[error("coupon has expired")]
    Expired,

    /// The coupon has been redeemed as many times as allowed.
    #[error("coupon usage limit reached")]
    Exhausted,

    /// The order subtotal does not qualify.
    #[error("order subtotal is below the minimum of {minimum} required by this coupon")]
    BelowMinimum {
        /// Minimum subtotal, in minor units, required to redeem.
        minimum: u64,
    },
}

/// The redemption rules attached to a coupon code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouponRules {
    /// The reduction the coupon applies to the subtotal.
    #[serde(flatten)]
    pub kind: DiscountKind,

    /// Smallest subtotal, in minor units, the coupon may be applied to.
    pub min_amount: Option<u64>,

    /// Instant after which the coupon can no longer be redeemed.
    pub expiry_date: Option<Timestamp>,

    /// Total number of redemptions allowed across all orders.
    pub usage_limit: Option<u32>,

    /// Whether the coupon is currently switched on.
    pub is_active: bool,
}

impl CouponRules {
    /// Checks that the rules are worth saving.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidDiscount`] when the underlying reduction is
    /// misconfigured.
    pub fn validate(&self) -> Result<(), InvalidDiscount> {
        self.kind.validate()
    }
}

/// Validates a coupon against the current subtotal and computes the
/// discount it grants.
///
/// Checks short-circuit in a fixed order: active flag, expiry, usage
/// limit, minimum subtotal. The returned discount is always within
/// `[0, subtotal]`.
///
/// # Errors
///
/// - [`CouponError::Inactive`]: the coupon is switched off.
/// - [`CouponError::Expired`]: `now` is past the expiry date.
/// - [`CouponError::Exhausted`]: the usage limit has been reached.
/// - [`CouponError::BelowMinimum`]: the subtotal does not qualify; the
///   error carries the required minimum.
pub fn coupon_discount(
    rules: &CouponRules,
    usage_count: u32,
    subtotal: u64,
    now: Timestamp,
) -> Result<u64, CouponError> {
    if !rules.is_active {
        return Err(CouponError::Inactive);
    }

    if rules.expiry_date.is_some_and(|expiry| now > expiry) {
        return Err(CouponError::Expired);
    }

    if rules.usage_limit.is_some_and(|limit| usage_count >= limit) {
        return Err(CouponError::Exhausted);
    }

    if let Some(minimum) = rules.min_amount
        && subtotal < minimum
    {
        return Err(CouponError::BelowMinimum { minimum });
    }

    let discount = match rules.kind {
        DiscountKind::Percentage {
            percent,
            max_discount,
        } => {
            let amount = percent_of_minor(percent, subtotal).unwrap_or(0);

            match max_discount {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
        DiscountKind::Fixed { amount } => amount,
    };

    Ok(discount.min(subtotal))
}
