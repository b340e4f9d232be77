//! Product Models

use jiff::Timestamp;

use crate::{
    pricing::{ProductDiscount, resolve_unit_price},
    uuids::TypedUuid,
};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub title: String,
    /// Undiscounted price in minor units.
    pub base_price: u64,
    /// Units currently available for sale.
    pub stock: u32,
    pub discount: Option<ProductDiscount>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    /// Resolves the effective unit price at the given instant.
    #[must_use]
    pub fn unit_price(&self, now: Timestamp) -> u64 {
        resolve_unit_price(self.base_price, self.discount.as_ref(), now)
    }
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub title: String,
    pub base_price: u64,
    pub stock: u32,
    pub discount: Option<ProductDiscount>,
}

/// Product Update Model
///
/// `None` fields are left unchanged; `discount: Some(None)` clears the
/// discount.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub base_price: Option<u64>,
    pub stock: Option<u32>,
    pub discount: Option<Option<ProductDiscount>>,
}
