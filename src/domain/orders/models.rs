//! Order Models
//!
//! The order document is an immutable snapshot: once placed, its lines and
//! totals never track later catalog or coupon edits. It serializes to the
//! camelCase JSON shape the storefront persists.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{coupons::models::CouponCode, products::models::ProductUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Customer contact and delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl CustomerInfo {
    /// Returns the name of the first required field left blank, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// Where the order stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

/// A product line frozen into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(rename = "productId")]
    pub product_uuid: ProductUuid,
    pub title: String,
    /// Effective unit price paid, minor units.
    pub price: u64,
    pub quantity: u32,
}

/// The coupon snapshot frozen into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    /// The discount the coupon granted against this order's subtotal.
    pub discount: u64,
}

/// Order Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub uuid: OrderUuid,
    pub products: Vec<OrderLine>,
    pub customer_info: CustomerInfo,
    pub coupon: Option<AppliedCoupon>,
    /// Sum of effective line totals, minor units.
    pub subtotal: u64,
    /// Coupon discount subtracted from the subtotal, minor units.
    pub discount: u64,
    /// The amount charged, minor units.
    pub total_price: u64,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            address: "1 Test Lane".to_string(),
            city: "Testington".to_string(),
            postal_code: "TE5 7PC".to_string(),
        }
    }

    #[test]
    fn complete_customer_info_has_no_missing_field() {
        assert_eq!(customer().missing_field(), None);
    }

    #[test]
    fn blank_fields_are_reported_in_order() {
        let mut info = customer();
        info.email = "   ".to_string();
        info.city = String::new();

        assert_eq!(info.missing_field(), Some("email"));
    }
}
