//! Coupons service.
//!
//! The admin-owned coupon store. Lookups key on the normalised code, so a
//! customer typing `summer10` finds the coupon saved as `SUMMER10`.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::{
    domain::coupons::{
        errors::CouponsServiceError,
        models::{Coupon, CouponCode, NewCoupon},
    },
    pricing::CouponRules,
};

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Retrieves all coupons.
    async fn list_coupons(&self) -> Vec<Coupon>;

    /// Retrieve a single coupon by normalised code.
    async fn get_coupon(&self, code: &CouponCode) -> Result<Coupon, CouponsServiceError>;

    /// Creates a new coupon.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError>;

    /// Replaces the rules of an existing coupon.
    async fn update_coupon(
        &self,
        code: &CouponCode,
        rules: CouponRules,
    ) -> Result<Coupon, CouponsServiceError>;

    /// Deletes a coupon.
    async fn delete_coupon(&self, code: &CouponCode) -> Result<(), CouponsServiceError>;

    /// Records one redemption, only if the usage limit permits another.
    async fn increment_usage(&self, code: &CouponCode) -> Result<(), CouponsServiceError>;
}

/// In-memory [`CouponsService`].
#[derive(Debug, Default)]
pub struct MemoryCouponsService {
    coupons: RwLock<FxHashMap<CouponCode, Coupon>>,
}

impl MemoryCouponsService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponsService for MemoryCouponsService {
    async fn list_coupons(&self) -> Vec<Coupon> {
        self.coupons.read().await.values().cloned().collect()
    }

    async fn get_coupon(&self, code: &CouponCode) -> Result<Coupon, CouponsServiceError> {
        self.coupons
            .read()
            .await
            .get(code)
            .cloned()
            .ok_or(CouponsServiceError::NotFound)
    }

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, CouponsServiceError> {
        coupon.rules.validate()?;

        let mut coupons = self.coupons.write().await;

        if coupons.contains_key(&coupon.code) {
            return Err(CouponsServiceError::AlreadyExists);
        }

        let now = Timestamp::now();

        let created = Coupon {
            code: coupon.code,
            rules: coupon.rules,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };

        coupons.insert(created.code.clone(), created.clone());

        Ok(created)
    }

    async fn update_coupon(
        &self,
        code: &CouponCode,
        rules: CouponRules,
    ) -> Result<Coupon, CouponsServiceError> {
        rules.validate()?;

        let mut coupons = self.coupons.write().await;
        let existing = coupons.get_mut(code).ok_or(CouponsServiceError::NotFound)?;

        existing.rules = rules;
        existing.updated_at = Timestamp::now();

        Ok(existing.clone())
    }

    async fn delete_coupon(&self, code: &CouponCode) -> Result<(), CouponsServiceError> {
        self.coupons
            .write()
            .await
            .remove(code)
            .map(|_| ())
            .ok_or(CouponsServiceError::NotFound)
    }

    async fn increment_usage(&self, code: &CouponCode) -> Result<(), CouponsServiceError> {
        // Checked and applied under one write guard, so two concurrent
        // checkouts cannot both take the final allowed redemption.
        let mut coupons = self.coupons.write().await;
        let existing = coupons.get_mut(code).ok_or(CouponsServiceError::NotFound)?;

        if existing
            .rules
            .usage_limit
            .is_some_and(|limit| existing.usage_count >= limit)
        {
            return Err(CouponsServiceError::Exhausted);
        }

        existing.usage_count += 1;
        existing.updated_at = Timestamp::now();

        Ok(())
    }
}
