//! Orders service.
//!
//! Checkout finalization. Placing an order recomputes every total from the
//! live cart, commits the stock and coupon-usage mutations conditionally,
//! and freezes the result into an immutable order document.

use std::{fmt, sync::Arc};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{
    domain::{
        carts::{
            models::{CartLine, CartUuid},
            service::MemoryCartsService,
        },
        coupons::service::CouponsService,
        orders::{
            errors::OrdersServiceError,
            models::{AppliedCoupon, CustomerInfo, Order, OrderLine, OrderStatus, OrderUuid},
        },
        products::service::ProductsService,
    },
    pricing::{aggregate, coupon_discount, finalize},
};

/// In-memory [`Order`] store and checkout entrypoint.
#[derive(Clone)]
pub struct MemoryOrdersService {
    products: Arc<dyn ProductsService>,
    coupons: Arc<dyn CouponsService>,
    carts: MemoryCartsService,
    orders: Arc<RwLock<FxHashMap<OrderUuid, Order>>>,
}

impl fmt::Debug for MemoryOrdersService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryOrdersService").finish_non_exhaustive()
    }
}

impl MemoryOrdersService {
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductsService>,
        coupons: Arc<dyn CouponsService>,
        carts: MemoryCartsService,
    ) -> Self {
        Self {
            products,
            coupons,
            carts,
            orders: Arc::new(RwLock::new(FxHashMap::default())),
        }
    }

    /// Retrieve a single order.
    ///
    /// # Errors
    ///
    /// - [`OrdersServiceError::NotFound`]: no order with that UUID.
    pub async fn get_order(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.orders
            .read()
            .await
            .get(&uuid)
            .cloned()
            .ok_or(OrdersServiceError::NotFound)
    }

    /// Retrieves all placed orders.
    pub async fn list_orders(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }

    /// Places an order for the given cart.
    ///
    /// Totals and the coupon discount are recomputed from the live cart,
    /// never reused from an earlier application. Stock is taken per line
    /// with a conditional decrement; if any line cannot be covered, the
    /// units already taken are restored and the checkout fails with the
    /// cart intact. The coupon redemption is recorded the same way. On
    /// success the frozen order is stored and the cart deleted.
    ///
    /// # Errors
    ///
    /// - [`OrdersServiceError::EmptyCart`]: the cart holds no lines.
    /// - [`OrdersServiceError::MissingCustomerField`]: a required contact
    ///   or address field is blank.
    /// - [`OrdersServiceError::OutOfStock`]: a line exceeds the remaining
    ///   stock at commit time.
    /// - [`OrdersServiceError::Coupon`]: the applied coupon no longer
    ///   validates, or its final redemption was taken concurrently.
    pub async fn place_order(
        &self,
        cart: CartUuid,
        customer: CustomerInfo,
        now: Timestamp,
    ) -> Result<Order, OrdersServiceError> {
        let cart = self.carts.get_cart(cart).await?;

        if cart.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        if let Some(field) = customer.missing_field() {
            return Err(OrdersServiceError::MissingCustomerField(field));
        }

        let totals = aggregate(&cart.priced_lines());

        let coupon = match &cart.coupon {
            Some(code) => {
                let coupon = self.coupons.get_coupon(code).await?;
                let discount =
                    coupon_discount(&coupon.rules, coupon.usage_count, totals.subtotal, now)?;

                Some(AppliedCoupon {
                    code: coupon.code,
                    discount,
                })
            }
            None => None,
        };

        let discount = coupon.as_ref().map_or(0, |applied| applied.discount);

        self.commit_stock(&cart.lines).await?;

        if let Some(applied) = &coupon
            && let Err(error) = self.coupons.increment_usage(&applied.code).await
        {
            self.release_stock(&cart.lines).await;

            return Err(error.into());
        }

        let order = Order {
            uuid: OrderUuid::new(),
            products: cart
                .lines
                .iter()
                .map(|line| OrderLine {
                    product_uuid: line.product_uuid,
                    title: line.title.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            customer_info: customer,
            coupon,
            subtotal: totals.subtotal,
            discount,
            total_price: finalize(totals.subtotal, discount),
            status: OrderStatus::Pending,
            created_at: now,
        };

        self.orders.write().await.insert(order.uuid, order.clone());

        // The cart is spent; a race with a concurrent delete is harmless.
        let _ = self.carts.delete_cart(cart.uuid).await;

        tracing::info!(
            order = %order.uuid,
            subtotal = order.subtotal,
            discount = order.discount,
            total_price = order.total_price,
            "order placed"
        );

        Ok(order)
    }

    /// Takes stock for every line, restoring earlier lines if one fails.
    async fn commit_stock(&self, lines: &[CartLine]) -> Result<(), OrdersServiceError> {
        for (index, line) in lines.iter().enumerate() {
            if let Err(error) = self
                .products
                .decrement_stock(line.product_uuid, line.quantity)
                .await
            {
                self.release_stock(&lines[..index]).await;

                return Err(error.into());
            }
        }

        Ok(())
    }

    /// Puts back stock taken by a checkout that could not complete.
    async fn release_stock(&self, lines: &[CartLine]) {
        for line in lines {
            if let Err(error) = self
                .products
                .restore_stock(line.product_uuid, line.quantity)
                .await
            {
                tracing::warn!(
                    product = %line.product_uuid,
                    quantity = line.quantity,
                    %error,
                    "failed to restore stock after aborted checkout"
                );
            }
        }
    }
}
