//! Products service errors.

use thiserror::Error;

use crate::pricing::InvalidDiscount;

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product already exists")]
    AlreadyExists,

    #[error("product not found")]
    NotFound,

    #[error("insufficient stock: {requested} requested, {available} available")]
    OutOfStock { requested: u32, available: u32 },

    #[error(transparent)]
    InvalidDiscount(#[from] InvalidDiscount),
}
