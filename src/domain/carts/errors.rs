//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::{coupons::errors::CouponsServiceError, products::errors::ProductsServiceError},
    pricing::CouponError,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart already exists")]
    AlreadyExists,

    #[error("cart not found")]
    NotFound,

    #[error("product is not in the cart")]
    LineNotFound,

    #[error("quantity must be at least one")]
    ZeroQuantity,

    #[error("insufficient stock: {requested} requested, {available} available")]
    OutOfStock { requested: u32, available: u32 },

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("catalog error")]
    Products(#[source] ProductsServiceError),

    #[error("coupon store error")]
    Coupons(#[source] CouponsServiceError),
}

impl From<ProductsServiceError> for CartsServiceError {
    fn from(error: ProductsServiceError) -> Self {
        match error {
            ProductsServiceError::OutOfStock {
                requested,
                available,
            } => Self::OutOfStock {
                requested,
                available,
            },
            other => Self::Products(other),
        }
    }
}

impl From<CouponsServiceError> for CartsServiceError {
    fn from(error: CouponsServiceError) -> Self {
        match error {
            CouponsServiceError::NotFound => Self::Coupon(CouponError::NotFound),
            CouponsServiceError::Exhausted => Self::Coupon(CouponError::Exhausted),
            other => Self::Coupons(other),
        }
    }
}
