//! Coupons service errors.

use thiserror::Error;

use crate::pricing::InvalidDiscount;

#[derive(Debug, Error)]
pub enum CouponsServiceError {
    #[error("coupon already exists")]
    AlreadyExists,

    #[error("coupon not found")]
    NotFound,

    #[error("coupon usage limit reached")]
    Exhausted,

    #[error(transparent)]
    InvalidDiscount(#[from] InvalidDiscount),
}
