//! Carts service.
//!
//! Cart mutation entrypoints enforce the quantity rules (at least one,
//! never above current stock); the totals themselves come from the pure
//! pricing core. The applied coupon is re-validated against the current
//! subtotal on every summary, so a stale discount amount can never leak
//! across a cart change.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{Cart, CartLine, CartSummary, CartUuid, NewCart},
        },
        coupons::{models::CouponCode, service::CouponsService},
        products::{models::ProductUuid, service::ProductsService},
    },
    pricing::{aggregate, coupon_discount, finalize},
};

/// In-memory cart sessions over the catalog and coupon collaborators.
#[derive(Clone)]
pub struct MemoryCartsService {
    products: Arc<dyn ProductsService>,
    coupons: Arc<dyn CouponsService>,
    carts: Arc<RwLock<FxHashMap<CartUuid, Cart>>>,
}

impl fmt::Debug for MemoryCartsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCartsService").finish_non_exhaustive()
    }
}

impl MemoryCartsService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductsService>, coupons: Arc<dyn CouponsService>) -> Self {
        Self {
            products,
            coupons,
            carts: Arc::new(RwLock::new(FxHashMap::default())),
        }
    }

    /// Creates a new, empty cart with the given UUID.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::AlreadyExists`]: a cart with that UUID exists.
    pub async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError> {
        let mut carts = self.carts.write().await;

        if carts.contains_key(&cart.uuid) {
            return Err(CartsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = Cart {
            uuid: cart.uuid,
            lines: Vec::new(),
            coupon: None,
            created_at: now,
            updated_at: now,
        };

        carts.insert(created.uuid, created.clone());

        Ok(created)
    }

    /// Retrieve a single cart.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    pub async fn get_cart(&self, uuid: CartUuid) -> Result<Cart, CartsServiceError> {
        self.carts
            .read()
            .await
            .get(&uuid)
            .cloned()
            .ok_or(CartsServiceError::NotFound)
    }

    /// Deletes a cart, e.g. once its order has been placed.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    pub async fn delete_cart(&self, uuid: CartUuid) -> Result<(), CartsServiceError> {
        self.carts
            .write()
            .await
            .remove(&uuid)
            .map(|_| ())
            .ok_or(CartsServiceError::NotFound)
    }

    /// Adds `quantity` units of a product to the cart.
    ///
    /// A line already holding the product keeps its original price
    /// snapshot and has its quantity increased; a new line snapshots the
    /// product's title, base price and resolved unit price at this
    /// instant.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::ZeroQuantity`]: `quantity` is zero.
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    /// - [`CartsServiceError::OutOfStock`]: the requested line quantity
    ///   exceeds the product's current stock.
    /// - [`CartsServiceError::Products`]: the catalog lookup failed.
    pub async fn add_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
        now: Timestamp,
    ) -> Result<CartLine, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::ZeroQuantity);
        }

        let product = self.products.get_product(product).await?;

        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)?;

        let existing_quantity = cart
            .lines
            .iter()
            .find(|line| line.product_uuid == product.uuid)
            .map_or(0, |line| line.quantity);

        let requested = existing_quantity.saturating_add(quantity);

        if requested > product.stock {
            return Err(CartsServiceError::OutOfStock {
                requested,
                available: product.stock,
            });
        }

        let line = match cart
            .lines
            .iter_mut()
            .find(|line| line.product_uuid == product.uuid)
        {
            Some(line) => {
                line.quantity = requested;
                line.clone()
            }
            None => {
                let line = CartLine {
                    product_uuid: product.uuid,
                    title: product.title.clone(),
                    base_price: product.base_price,
                    unit_price: product.unit_price(now),
                    quantity,
                };

                cart.lines.push(line.clone());
                line
            }
        };

        cart.updated_at = Timestamp::now();

        Ok(line)
    }

    /// Sets the quantity of a product already in the cart.
    ///
    /// A quantity of zero removes the line rather than leaving a
    /// zero-quantity line behind.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    /// - [`CartsServiceError::LineNotFound`]: the product is not in the cart.
    /// - [`CartsServiceError::OutOfStock`]: `quantity` exceeds the
    ///   product's current stock.
    pub async fn update_quantity(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartsServiceError> {
        if quantity == 0 {
            return self.remove_item(cart, product).await;
        }

        let available = self.products.get_product(product).await?.stock;

        if quantity > available {
            return Err(CartsServiceError::OutOfStock {
                requested: quantity,
                available,
            });
        }

        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)?;

        let line = cart
            .lines
            .iter_mut()
            .find(|line| line.product_uuid == product)
            .ok_or(CartsServiceError::LineNotFound)?;

        line.quantity = quantity;
        cart.updated_at = Timestamp::now();

        Ok(())
    }

    /// Removes a product's line from the cart.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    /// - [`CartsServiceError::LineNotFound`]: the product is not in the cart.
    pub async fn remove_item(
        &self,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)?;

        let before = cart.lines.len();
        cart.lines.retain(|line| line.product_uuid != product);

        if cart.lines.len() == before {
            return Err(CartsServiceError::LineNotFound);
        }

        cart.updated_at = Timestamp::now();

        Ok(())
    }

    /// Applies a coupon to the cart.
    ///
    /// The code is validated against the cart's current subtotal; on
    /// success only the code is stored and the granted discount is
    /// returned. On failure the cart is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    /// - [`CartsServiceError::Coupon`]: the coupon does not exist or its
    ///   rules reject the current subtotal.
    pub async fn apply_coupon(
        &self,
        cart: CartUuid,
        code: &CouponCode,
        now: Timestamp,
    ) -> Result<u64, CartsServiceError> {
        let coupon = self.coupons.get_coupon(code).await?;

        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)?;

        let totals = aggregate(&cart.priced_lines());
        let discount = coupon_discount(&coupon.rules, coupon.usage_count, totals.subtotal, now)?;

        cart.coupon = Some(coupon.code.clone());
        cart.updated_at = Timestamp::now();

        tracing::info!(cart = %cart.uuid, coupon = %coupon.code, discount, "coupon applied");

        Ok(discount)
    }

    /// Removes any applied coupon, leaving the lines untouched.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    pub async fn remove_coupon(&self, cart: CartUuid) -> Result<(), CartsServiceError> {
        let mut carts = self.carts.write().await;
        let cart = carts.get_mut(&cart).ok_or(CartsServiceError::NotFound)?;

        cart.coupon = None;
        cart.updated_at = Timestamp::now();

        Ok(())
    }

    /// Computes the cart's totals as they currently stand.
    ///
    /// Everything is recomputed from scratch, including the coupon
    /// discount against the current subtotal. A coupon that no longer
    /// validates surfaces its rejection instead of a silently stale or
    /// dropped discount.
    ///
    /// # Errors
    ///
    /// - [`CartsServiceError::NotFound`]: no cart with that UUID.
    /// - [`CartsServiceError::Coupon`]: the applied coupon no longer
    ///   validates against the current subtotal.
    pub async fn summary(
        &self,
        cart: CartUuid,
        now: Timestamp,
    ) -> Result<CartSummary, CartsServiceError> {
        let cart = self.get_cart(cart).await?;
        let totals = aggregate(&cart.priced_lines());

        let coupon_discount = match &cart.coupon {
            Some(code) => {
                let coupon = self.coupons.get_coupon(code).await?;

                coupon_discount(&coupon.rules, coupon.usage_count, totals.subtotal, now)?
            }
            None => 0,
        };

        Ok(CartSummary {
            subtotal: totals.subtotal,
            product_discount_savings: totals.product_discount_savings,
            coupon_discount,
            final_total: finalize(totals.subtotal, coupon_discount),
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            coupons::{
                models::NewCoupon,
                service::{MemoryCouponsService, MockCouponsService},
            },
            products::{
                errors::ProductsServiceError,
                models::NewProduct,
                service::{MemoryProductsService, MockProductsService},
            },
        },
        pricing::{CouponError, CouponRules, DiscountKind},
    };

    use super::*;

    struct TestContext {
        products: Arc<MemoryProductsService>,
        coupons: Arc<MemoryCouponsService>,
        carts: MemoryCartsService,
    }

    impl TestContext {
        fn new() -> Self {
            let products = Arc::new(MemoryProductsService::new());
            let coupons = Arc::new(MemoryCouponsService::new());
            let carts = MemoryCartsService::new(products.clone(), coupons.clone());

            Self {
                products,
                coupons,
                carts,
            }
        }

        async fn create_product(&self, base_price: u64, stock: u32) -> ProductUuid {
            self.products
                .create_product(NewProduct {
                    uuid: ProductUuid::new(),
                    title: "Teapot".to_string(),
                    base_price,
                    stock,
                    discount: None,
                })
                .await
                .map(|product| product.uuid)
                .unwrap_or_else(|error| panic!("create_product failed: {error}"))
        }

        async fn create_cart(&self) -> CartUuid {
            self.carts
                .create_cart(NewCart {
                    uuid: CartUuid::new(),
                })
                .await
                .map(|cart| cart.uuid)
                .unwrap_or_else(|error| panic!("create_cart failed: {error}"))
        }
    }

    fn fixed_coupon(code: &str, amount: u64, min_amount: Option<u64>) -> NewCoupon {
        NewCoupon {
            code: CouponCode::new(code),
            rules: CouponRules {
                kind: DiscountKind::Fixed { amount },
                min_amount,
                expiry_date: None,
                usage_limit: None,
                is_active: true,
            },
        }
    }

    #[tokio::test]
    async fn add_item_snapshots_the_product() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        let line = ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;

        assert_eq!(line.base_price, 100);
        assert_eq!(line.unit_price, 100);
        assert_eq!(line.quantity, 2);

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_merges_the_line() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;
        let line = ctx.carts.add_item(cart, product, 1, Timestamp::now()).await?;

        assert_eq!(line.quantity, 3);
        assert_eq!(ctx.carts.get_cart(cart).await?.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_zero_quantity() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        let result = ctx.carts.add_item(cart, product, 0, Timestamp::now()).await;

        assert!(
            matches!(result, Err(CartsServiceError::ZeroQuantity)),
            "expected ZeroQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_quantity_above_stock() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 2).await;
        let cart = ctx.create_cart().await;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;

        let result = ctx.carts.add_item(cart, product, 1, Timestamp::now()).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::OutOfStock {
                    requested: 3,
                    available: 2,
                })
            ),
            "expected OutOfStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_surfaces_unknown_product() -> TestResult {
        // The catalog collaborator is mocked so the lookup fails on demand.
        let mut products = MockProductsService::new();

        products
            .expect_get_product()
            .return_once(|_| Err(ProductsServiceError::NotFound));

        let carts = MemoryCartsService::new(
            Arc::new(products),
            Arc::new(MockCouponsService::new()),
        );

        let cart = carts
            .create_cart(NewCart {
                uuid: CartUuid::new(),
            })
            .await?;

        let result = carts
            .add_item(cart.uuid, ProductUuid::new(), 1, Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Products(ProductsServiceError::NotFound))
            ),
            "expected Products(NotFound), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_to_zero_removes_the_line() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;
        ctx.carts.update_quantity(cart, product, 0).await?;

        assert!(ctx.carts.get_cart(cart).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_rejects_quantity_above_stock() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 2).await;
        let cart = ctx.create_cart().await;

        ctx.carts.add_item(cart, product, 1, Timestamp::now()).await?;

        let result = ctx.carts.update_quantity(cart, product, 3).await;

        assert!(
            matches!(result, Err(CartsServiceError::OutOfStock { .. })),
            "expected OutOfStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_unknown_line_returns_line_not_found() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        let result = ctx.carts.update_quantity(cart, product, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::LineNotFound)),
            "expected LineNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn line_keeps_its_snapshot_after_a_price_change() -> TestResult {
        use crate::domain::products::models::ProductUpdate;

        let ctx = TestContext::new();
        let product = ctx.create_product(100, 5).await;
        let cart = ctx.create_cart().await;

        ctx.carts.add_item(cart, product, 1, Timestamp::now()).await?;

        ctx.products
            .update_product(
                product,
                ProductUpdate {
                    base_price: Some(500),
                    ..ProductUpdate::default()
                },
            )
            .await?;

        let summary = ctx.carts.summary(cart, Timestamp::now()).await?;

        assert_eq!(summary.subtotal, 100, "snapshot must not track catalog edits");

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_stores_only_the_code() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(80, 5).await;
        let cart = ctx.create_cart().await;

        ctx.coupons
            .create_coupon(fixed_coupon("SAVE15", 15, Some(50)))
            .await?;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;

        let discount = ctx
            .carts
            .apply_coupon(cart, &CouponCode::new("save15"), Timestamp::now())
            .await?;

        assert_eq!(discount, 15);
        assert_eq!(
            ctx.carts.get_cart(cart).await?.coupon,
            Some(CouponCode::new("SAVE15"))
        );

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_below_minimum_leaves_cart_unchanged() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(80, 5).await;
        let cart = ctx.create_cart().await;

        ctx.coupons
            .create_coupon(fixed_coupon("BIGSPEND", 15, Some(200)))
            .await?;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;

        let result = ctx
            .carts
            .apply_coupon(cart, &CouponCode::new("BIGSPEND"), Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Coupon(CouponError::BelowMinimum {
                    minimum: 200,
                }))
            ),
            "expected BelowMinimum, got {result:?}"
        );
        assert!(ctx.carts.get_cart(cart).await?.coupon.is_none());

        let summary = ctx.carts.summary(cart, Timestamp::now()).await?;

        assert_eq!(summary.final_total, 160, "failed coupon must not change totals");

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_unknown_code_returns_not_found() -> TestResult {
        let ctx = TestContext::new();
        let cart = ctx.create_cart().await;

        let result = ctx
            .carts
            .apply_coupon(cart, &CouponCode::new("NOPE"), Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Coupon(CouponError::NotFound))
            ),
            "expected Coupon(NotFound), got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn summary_recomputes_coupon_after_cart_change() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(80, 5).await;
        let cart = ctx.create_cart().await;

        ctx.coupons
            .create_coupon(fixed_coupon("SAVE15", 15, Some(150)))
            .await?;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;
        ctx.carts
            .apply_coupon(cart, &CouponCode::new("SAVE15"), Timestamp::now())
            .await?;

        // Dropping to one unit takes the subtotal below the coupon's
        // minimum; the recomputation must surface that, not reuse the old
        // discount.
        ctx.carts.update_quantity(cart, product, 1).await?;

        let result = ctx.carts.summary(cart, Timestamp::now()).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Coupon(CouponError::BelowMinimum {
                    minimum: 150,
                }))
            ),
            "expected BelowMinimum after quantity drop, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_coupon_restores_the_undiscounted_total() -> TestResult {
        let ctx = TestContext::new();
        let product = ctx.create_product(80, 5).await;
        let cart = ctx.create_cart().await;

        ctx.coupons
            .create_coupon(fixed_coupon("SAVE15", 15, None))
            .await?;

        ctx.carts.add_item(cart, product, 2, Timestamp::now()).await?;
        ctx.carts
            .apply_coupon(cart, &CouponCode::new("SAVE15"), Timestamp::now())
            .await?;
        ctx.carts.remove_coupon(cart).await?;

        let summary = ctx.carts.summary(cart, Timestamp::now()).await?;

        assert_eq!(summary.coupon_discount, 0);
        assert_eq!(summary.final_total, 160);

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_summary_is_all_zero() -> TestResult {
        let ctx = TestContext::new();
        let cart = ctx.create_cart().await;

        let summary = ctx.carts.summary(cart, Timestamp::now()).await?;

        assert_eq!(summary.subtotal, 0);
        assert_eq!(summary.product_discount_savings, 0);
        assert_eq!(summary.coupon_discount, 0);
        assert_eq!(summary.final_total, 0);

        Ok(())
    }
}
