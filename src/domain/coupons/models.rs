//! Coupon Models

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use crate::pricing::CouponRules;

/// A coupon code, normalised to trimmed uppercase.
///
/// Codes compare case-insensitively everywhere, so the normalisation
/// happens once at construction and the normalised form is the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalises and wraps a code as entered by a customer or admin.
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    /// Returns the normalised code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CouponCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl<'de> Deserialize<'de> for CouponCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|code| Self::new(&code))
    }
}

/// Coupon Model
#[derive(Debug, Clone)]
pub struct Coupon {
    pub code: CouponCode,
    pub rules: CouponRules,
    /// How many orders have redeemed this coupon.
    pub usage_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Coupon Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub code: CouponCode,
    pub rules: CouponRules,
}
