//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::round_amount;

/// A coupon grants either a flat amount or a fraction off the cart total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CouponDiscount {
    Amount(i64),
    /// Fraction in `(0, 1]`, so `0.1` is ten percent.
    Percent(Decimal),
}

impl CouponDiscount {
    pub fn apply(&self, total: i64) -> i64 {
        let discounted = match self {
            Self::Amount(amount) => total.saturating_sub(*amount),
            Self::Percent(percent) => round_amount(Decimal::from(total) * (Decimal::ONE - percent)),
        };
        discounted.max(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount: CouponDiscount,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn create(code: impl Into<String>, discount: CouponDiscount, start_date: DateTime<Utc>, expiry_date: DateTime<Utc>) -> Self {
        Self { id: Uuid::now_v7(), code: code.into(), discount, start_date, expiry_date, created_at: Utc::now() }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.expiry_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_discount_floors_at_zero() {
        assert_eq!(CouponDiscount::Amount(50).apply(200), 150);
        assert_eq!(CouponDiscount::Amount(500).apply(200), 0);
    }

    #[test]
    fn test_percent_discount() {
        assert_eq!(CouponDiscount::Percent(dec!(0.1)).apply(200), 180);
        assert_eq!(CouponDiscount::Percent(dec!(1)).apply(200), 0);
        assert_eq!(CouponDiscount::Percent(dec!(0.15)).apply(99), 84);
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let c = Coupon::create("SPRING", CouponDiscount::Amount(10), now - Duration::days(1), now + Duration::days(1));
        assert!(c.is_valid_at(now));
        assert!(!c.is_valid_at(now + Duration::days(2)));
        assert!(!c.is_valid_at(now - Duration::days(2)));
        assert!(c.is_valid_at(c.expiry_date));
    }
}
