//! Products service.
//!
//! The catalog collaborator. Persistence is outside this crate, so the
//! concrete implementation keeps products in memory behind the same
//! service-trait seam a database-backed implementation would use.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::products::{
    errors::ProductsServiceError,
    models::{NewProduct, Product, ProductUpdate, ProductUuid},
};

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all products.
    async fn list_products(&self) -> Vec<Product>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Creates a new product.
    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError>;

    /// Updates a product with the given UUID.
    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError>;

    /// Deletes a product with the given UUID.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;

    /// Takes `quantity` units out of stock, only if that many remain.
    async fn decrement_stock(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), ProductsServiceError>;

    /// Puts `quantity` units back into stock after a failed checkout.
    async fn restore_stock(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), ProductsServiceError>;
}

/// In-memory [`ProductsService`].
#[derive(Debug, Default)]
pub struct MemoryProductsService {
    products: RwLock<FxHashMap<ProductUuid, Product>>,
}

impl MemoryProductsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductsService for MemoryProductsService {
    async fn list_products(&self) -> Vec<Product> {
        self.products.read().await.values().cloned().collect()
    }

    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        self.products
            .read()
            .await
            .get(&product)
            .cloned()
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, ProductsServiceError> {
        if let Some(discount) = &product.discount {
            discount.validate()?;
        }

        let mut products = self.products.write().await;

        if products.contains_key(&product.uuid) {
            return Err(ProductsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = Product {
            uuid: product.uuid,
            title: product.title,
            base_price: product.base_price,
            stock: product.stock,
            discount: product.discount,
            created_at: now,
            updated_at: now,
        };

        products.insert(created.uuid, created.clone());

        Ok(created)
    }

    async fn update_product(
        &self,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<Product, ProductsServiceError> {
        if let Some(Some(discount)) = &update.discount {
            discount.validate()?;
        }

        let mut products = self.products.write().await;
        let existing = products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        if let Some(title) = update.title {
            existing.title = title;
        }

        if let Some(base_price) = update.base_price {
            existing.base_price = base_price;
        }

        if let Some(stock) = update.stock {
            existing.stock = stock;
        }

        if let Some(discount) = update.discount {
            existing.discount = discount;
        }

        existing.updated_at = Timestamp::now();

        Ok(existing.clone())
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        self.products
            .write()
            .await
            .remove(&product)
            .map(|_| ())
            .ok_or(ProductsServiceError::NotFound)
    }

    async fn decrement_stock(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), ProductsServiceError> {
        // Checked and applied under one write guard, so two concurrent
        // checkouts cannot both take the last unit.
        let mut products = self.products.write().await;
        let existing = products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        if existing.stock < quantity {
            return Err(ProductsServiceError::OutOfStock {
                requested: quantity,
                available: existing.stock,
            });
        }

        existing.stock -= quantity;
        existing.updated_at = Timestamp::now();

        Ok(())
    }

    async fn restore_stock(
        &self,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), ProductsServiceError> {
        let mut products = self.products.write().await;
        let existing = products
            .get_mut(&product)
            .ok_or(ProductsServiceError::NotFound)?;

        existing.stock = existing.stock.saturating_add(quantity);
        existing.updated_at = Timestamp::now();

        Ok(())
    }
}
