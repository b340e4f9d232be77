//! Orders service errors.

use thiserror::Error;

use crate::{
    domain::{
        carts::errors::CartsServiceError, coupons::errors::CouponsServiceError,
        products::errors::ProductsServiceError,
    },
    pricing::CouponError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    #[error("missing required customer field: {0}")]
    MissingCustomerField(&'static str),

    #[error("insufficient stock: {requested} requested, {available} available")]
    OutOfStock { requested: u32, available: u32 },

    #[error(transparent)]
    Coupon(CouponError),

    #[error("cart error")]
    Carts(#[source] CartsServiceError),

    #[error("catalog error")]
    Products(#[source] ProductsServiceError),

    #[error("coupon store error")]
    Coupons(#[source] CouponsServiceError),
}

impl From<CartsServiceError> for OrdersServiceError {
    fn from(error: CartsServiceError) -> Self {
        match error {
            CartsServiceError::Coupon(coupon) => Self::Coupon(coupon),
            CartsServiceError::OutOfStock {
                requested,
                available,
            } => Self::OutOfStock {
                requested,
                available,
            },
            other => Self::Carts(other),
        }
    }
}

impl From<ProductsServiceError> for OrdersServiceError {
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

impl From<CouponsServiceError> for OrdersServiceError {
    fn from(error: CouponsServiceError) -> Self {
        match error {
            CouponsServiceError::NotFound => Self::Coupon(CouponError::NotFound),
            CouponsServiceError::Exhausted => Self::Coupon(CouponError::Exhausted),
            other => Self::Coupons(other),
        }
    }
}

impl From<CouponError> for OrdersServiceError {
    fn from(error: CouponError) -> Self {
        Self::Coupon(error)
    }
}
