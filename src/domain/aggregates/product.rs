//! Product Aggregate and pricing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::round_amount;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Base price in whole currency units.
    pub price: i64,
    /// Percentage off the base price while the discount window is open.
    pub discount: i64,
    pub discount_start: Option<DateTime<Utc>>,
    pub discount_end: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub sizes: Vec<String>,
    pub materials: Vec<String>,
    pub inserts: Vec<String>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn create(name: impl Into<String>, price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), name: name.into(), description: None, price,
            discount: 0, discount_start: None, discount_end: None, category_id: None,
            sizes: vec![], materials: vec![], inserts: vec![], images: vec![],
            created_at: now, updated_at: now,
        }
    }

    pub fn with_discount(mut self, percent: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.discount = percent;
        self.discount_start = Some(start);
        self.discount_end = Some(end);
        self
    }

    pub fn discount_active(&self, now: DateTime<Utc>) -> bool {
        if self.discount <= 0 { return false; }
        match (self.discount_start, self.discount_end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Unit price a customer pays for `product` at `now`.
pub fn effective_price(product: &Product, now: DateTime<Utc>) -> i64 {
    if !product.discount_active(now) {
        return product.price;
    }
    let discounted = Decimal::from(product.price) * Decimal::from(100 - product.discount) / Decimal::from(100);
    round_amount(discounted)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(name: impl Into<String>, description: Option<String>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), description, created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_no_discount_keeps_base_price() {
        let p = Product::create("Ring", 1299);
        assert_eq!(effective_price(&p, Utc::now()), 1299);
    }

    #[test]
    fn test_discount_outside_window_keeps_base_price() {
        let now = Utc::now();
        let expired = Product::create("Ring", 1000).with_discount(20, now - Duration::days(10), now - Duration::days(1));
        let upcoming = Product::create("Ring", 1000).with_discount(20, now + Duration::days(1), now + Duration::days(10));
        assert_eq!(effective_price(&expired, now), 1000);
        assert_eq!(effective_price(&upcoming, now), 1000);
    }

    #[test]
    fn test_discount_inside_window() {
        let now = Utc::now();
        let p = Product::create("Pendant", 999).with_discount(15, now - Duration::hours(1), now + Duration::hours(1));
        // 999 * 85 / 100 = 849.15
        assert_eq!(effective_price(&p, now), 849);
        let p = Product::create("Chain", 250).with_discount(10, now - Duration::hours(1), now + Duration::hours(1));
        // 225.0 exactly
        assert_eq!(effective_price(&p, now), 225);
        let p = Product::create("Stud", 5).with_discount(50, now - Duration::hours(1), now + Duration::hours(1));
        // 2.5 rounds up
        assert_eq!(effective_price(&p, now), 3);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let starts_now = Product::create("Ring", 100).with_discount(30, now, now + Duration::days(1));
        let ends_now = Product::create("Ring", 100).with_discount(30, now - Duration::days(1), now);
        assert_eq!(effective_price(&starts_now, now), 70);
        assert_eq!(effective_price(&ends_now, now), 70);
    }

    #[test]
    fn test_discount_without_dates_is_ignored() {
        let mut p = Product::create("Ring", 100);
        p.discount = 40;
        assert_eq!(effective_price(&p, Utc::now()), 100);
    }
}
