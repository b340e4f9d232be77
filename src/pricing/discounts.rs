//! Product discount resolution.
//!
//! A product may carry a discount descriptor: a percentage or fixed
//! reduction, optionally capped and optionally limited to an active window.
//! [`resolve_unit_price`] turns the base price and descriptor into the
//! effective unit price.

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A discount configuration that should be refused at save time.
///
/// Reads stay lenient: a descriptor that slipped into the catalog in one of
/// these states resolves to "no discount" rather than an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidDiscount {
    /// Percentage must be greater than zero and at most 100.
    #[error("discount percentage must be greater than zero and at most 100")]
    PercentOutOfRange,

    /// A fixed discount of zero reduces nothing.
    #[error("fixed discount amount must be greater than zero")]
    ZeroAmount,

    /// The active window ends before it starts.
    #[error("discount window ends before it starts")]
    EmptyWindow,
}

/// The reduction a discount applies.
///
/// Amounts are in minor units; percentages are percentage points
/// (`percent: 20` means 20% off).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountKind {
    /// Reduce the price by a percentage of the amount it applies to.
    Percentage {
        /// Percentage points to take off.
        percent: Decimal,
        /// Largest reduction the percentage may produce, in minor units.
        max_discount: Option<u64>,
    },

    /// Reduce the price by a fixed amount in minor units.
    Fixed {
        /// Minor units to take off.
        amount: u64,
    },
}

impl DiscountKind {
    /// Checks that the configuration is worth saving.
    ///
    /// # Errors
    ///
    /// - [`InvalidDiscount::PercentOutOfRange`]: percentage outside `(0, 100]`.
    /// - [`InvalidDiscount::ZeroAmount`]: fixed amount of zero.
    pub fn validate(&self) -> Result<(), InvalidDiscount> {
        match *self {
            Self::Percentage { percent, .. } => {
                if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                    return Err(InvalidDiscount::PercentOutOfRange);
                }

                Ok(())
            }
            Self::Fixed { amount } => {
                if amount == 0 {
                    return Err(InvalidDiscount::ZeroAmount);
                }

                Ok(())
            }
        }
    }
}

/// Discount descriptor attached to a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductDiscount {
    /// The reduction to apply while the discount is active.
    #[serde(flatten)]
    pub kind: DiscountKind,

    /// Earliest instant the discount applies, if bounded.
    pub active_from: Option<Timestamp>,

    /// Latest instant the discount applies, if bounded.
    pub active_until: Option<Timestamp>,
}

impl ProductDiscount {
    /// Checks that the descriptor is worth saving.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidDiscount`] for an out-of-range reduction or a
    /// window that ends before it starts.
    pub fn validate(&self) -> Result<(), InvalidDiscount> {
        self.kind.validate()?;

        if let (Some(from), Some(until)) = (self.active_from, self.active_until)
            && until < from
        {
            return Err(InvalidDiscount::EmptyWindow);
        }

        Ok(())
    }

    /// Returns whether the discount applies at the given instant.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        if self.active_from.is_some_and(|from| now < from) {
            return false;
        }

        if self.active_until.is_some_and(|until| now > until) {
            return false;
        }

        true
    }
}

/// Resolves the effective unit price for a product.
///
/// Returns the base price unchanged when no discount is attached, the
/// discount is outside its active window, or the configuration is not
/// usable (non-positive percentage, zero fixed amount). The result is
/// always within `[0, base_price]`.
#[must_use]
pub fn resolve_unit_price(
    base_price: u64,
    discount: Option<&ProductDiscount>,
    now: Timestamp,
) -> u64 {
    let Some(discount) = discount else {
        return base_price;
    };

    if !discount.is_active_at(now) {
        return base_price;
    }

    let reduction = match discount.kind {
        DiscountKind::Percentage {
            percent,
            max_discount,
        } => {
            let Some(amount) = percent_of_minor(percent, base_price) else {
                return base_price;
            };

            match max_discount {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
        DiscountKind::Fixed { amount } => {
            if amount == 0 {
                return base_price;
            }

            amount
        }
    };

    base_price.saturating_sub(reduction)
}

/// Calculates `percent` of `minor` minor units, rounding midpoints away
/// from zero.
///
/// Returns `None` for non-positive percentages and for products too large
/// to represent, which callers treat as "no discount".
pub(crate) fn percent_of_minor(percent: Decimal, minor: u64) -> Option<u64> {
    if percent <= Decimal::ZERO {
        return None;
    }

    let applied = (percent / Decimal::ONE_HUNDRED).checked_mul(Decimal::from(minor))?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}

#[cfg(test)]
mod tests {
    use jiff::ToSpan;
    use rust_decimal::dec;

    use super::*;

    fn percentage(percent: Decimal) -> ProductDiscount {
        ProductDiscount {
            kind: DiscountKind::Percentage {
                percent,
                max_discount: None,
            },
            active_from: None,
            active_until: None,
        }
    }

    #[test]
    fn no_discount_returns_base_price() {
        assert_eq!(resolve_unit_price(100, None, Timestamp::now()), 100);
    }

    #[test]
    fn percentage_discount_reduces_price() {
        let discount = percentage(dec!(20));

        assert_eq!(resolve_unit_price(100, Some(&discount), Timestamp::now()), 80);
    }

    #[test]
    fn percentage_discount_clamps_to_cap() {
        let discount = ProductDiscount {
            kind: DiscountKind::Percentage {
                percent: dec!(50),
                max_discount: Some(30),
            },
            active_from: None,
            active_until: None,
        };

        assert_eq!(resolve_unit_price(100, Some(&discount), Timestamp::now()), 70);
    }

    #[test]
    fn percentage_discount_rounds_midpoint_away_from_zero() {
        // 15% of 75 is 11.25, which rounds down to 11.
        let discount = percentage(dec!(15));

        assert_eq!(resolve_unit_price(75, Some(&discount), Timestamp::now()), 64);

        // 50% of 25 is 12.5, which rounds away from zero to 13.
        let discount = percentage(dec!(50));

        assert_eq!(resolve_unit_price(25, Some(&discount), Timestamp::now()), 12);
    }

    #[test]
    fn fixed_discount_reduces_price() {
        let discount = ProductDiscount {
            kind: DiscountKind::Fixed { amount: 30 },
            active_from: None,
            active_until: None,
        };

        assert_eq!(resolve_unit_price(100, Some(&discount), Timestamp::now()), 70);
    }

    #[test]
    fn fixed_discount_never_goes_negative() {
        let discount = ProductDiscount {
            kind: DiscountKind::Fixed { amount: 150 },
            active_from: None,
            active_until: None,
        };

        assert_eq!(resolve_unit_price(100, Some(&discount), Timestamp::now()), 0);
    }

    #[test]
    fn non_positive_percentage_is_ignored() {
        let zero = percentage(Decimal::ZERO);
        let negative = percentage(dec!(-10));

        assert_eq!(resolve_unit_price(100, Some(&zero), Timestamp::now()), 100);
        assert_eq!(resolve_unit_price(100, Some(&negative), Timestamp::now()), 100);
    }

    #[test]
    fn zero_fixed_amount_is_ignored() {
        let discount = ProductDiscount {
            kind: DiscountKind::Fixed { amount: 0 },
            active_from: None,
            active_until: None,
        };

        assert_eq!(resolve_unit_price(100, Some(&discount), Timestamp::now()), 100);
    }

    #[test]
    fn discount_outside_window_is_ignored() {
        let now = Timestamp::now();

        let upcoming = ProductDiscount {
            active_from: Some(now + 1.hour()),
            ..percentage(dec!(20))
        };

        let lapsed = ProductDiscount {
            active_until: Some(now - 1.hour()),
            ..percentage(dec!(20))
        };

        assert_eq!(resolve_unit_price(100, Some(&upcoming), now), 100);
        assert_eq!(resolve_unit_price(100, Some(&lapsed), now), 100);
    }

    #[test]
    fn discount_inside_window_applies() {
        let now = Timestamp::now();

        let discount = ProductDiscount {
            active_from: Some(now - 1.hour()),
            active_until: Some(now + 1.hour()),
            ..percentage(dec!(20))
        };

        assert_eq!(resolve_unit_price(100, Some(&discount), now), 80);
    }

    #[test]
    fn validate_rejects_out_of_range_percentages() {
        assert_eq!(
            percentage(Decimal::ZERO).validate(),
            Err(InvalidDiscount::PercentOutOfRange)
        );
        assert_eq!(
            percentage(dec!(101)).validate(),
            Err(InvalidDiscount::PercentOutOfRange)
        );
        assert_eq!(percentage(dec!(100)).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_fixed_amount() {
        let kind = DiscountKind::Fixed { amount: 0 };

        assert_eq!(kind.validate(), Err(InvalidDiscount::ZeroAmount));
    }

    #[test]
    fn validate_rejects_empty_window() {
        let now = Timestamp::now();

        let discount = ProductDiscount {
            active_from: Some(now),
            active_until: Some(now - 1.hour()),
            ..percentage(dec!(20))
        };

        assert_eq!(discount.validate(), Err(InvalidDiscount::EmptyWindow));
    }

    #[test]
    fn resolved_price_never_exceeds_base_price() {
        for base in [0_u64, 1, 37, 100, 9_999] {
            for percent in [dec!(1), dec!(33.3), dec!(50), dec!(100)] {
                let discount = percentage(percent);
                let resolved = resolve_unit_price(base, Some(&discount), Timestamp::now());

                assert!(resolved <= base, "resolved {resolved} above base {base}");
            }
        }
    }
}
