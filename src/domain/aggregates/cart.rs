//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::coupon::CouponDiscount;
use crate::domain::aggregates::product::{effective_price, Product};
use crate::domain::value_objects::{ItemOptions, OrderId, Owner};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub owner: Owner,
    pub items: Vec<CartItem>,
    pub is_ordered: bool,
    pub order_id: Option<OrderId>,
    pub applied_coupon_code: Option<String>,
    pub applied_bonus_amount: Option<i64>,
    pub pre_total: i64,
    pub final_total: i64,
    pub email: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(flatten)]
    pub options: ItemOptions,
    /// Price per unit captured when the line was last added to; totals use this.
    pub unit_price: i64,
    /// Catalogue price before any discount at that moment.
    pub base_price: i64,
    pub discount_percent: i64,
}

impl CartItem {
    pub fn line_total(&self) -> i64 { self.unit_price.saturating_mul(i64::from(self.quantity)) }

    fn matches(&self, product_id: Uuid, options: &ItemOptions) -> bool {
        self.product_id == product_id && &self.options == options
    }
}

/// Price fields stamped onto a line at add time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinePrice {
    pub unit_price: i64,
    pub base_price: i64,
    pub discount_percent: i64,
}

impl LinePrice {
    pub fn for_product(product: &Product, now: DateTime<Utc>) -> Self {
        let discount_percent = if product.discount_active(now) { product.discount } else { 0 };
        Self { unit_price: effective_price(product, now), base_price: product.price, discount_percent }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus { Open, AwaitingPayment, Ordered }

impl Cart {
    pub fn new(owner: Owner) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), owner, items: vec![], is_ordered: false, order_id: None,
            applied_coupon_code: None, applied_bonus_amount: None, pre_total: 0, final_total: 0,
            email: None, reminder_sent: false, created_at: now, updated_at: now,
        }
    }

    pub fn status(&self) -> CartStatus {
        if self.is_ordered { CartStatus::Ordered }
        else if self.order_id.is_some() { CartStatus::AwaitingPayment }
        else { CartStatus::Open }
    }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn add_item(&mut self, product_id: Uuid, quantity: u32, options: ItemOptions, price: LinePrice) -> Result<(), CartError> {
        self.ensure_mutable()?;
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(product_id, &options)) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            existing.unit_price = price.unit_price;
            existing.base_price = price.base_price;
            existing.discount_percent = price.discount_percent;
        } else {
            self.items.push(CartItem {
                product_id, quantity, options,
                unit_price: price.unit_price, base_price: price.base_price, discount_percent: price.discount_percent,
            });
        }
        self.touch();
        Ok(())
    }

    /// Takes one unit off the matching line. Returns `false` when nothing matched.
    pub fn remove_item(&mut self, product_id: Uuid, options: &ItemOptions) -> Result<bool, CartError> {
        self.ensure_mutable()?;
        let Some(pos) = self.items.iter().position(|i| i.matches(product_id, options)) else { return Ok(false) };
        if self.items[pos].quantity > 1 {
            self.items[pos].quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        self.touch();
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), CartError> {
        self.ensure_mutable()?;
        self.items.clear();
        self.touch();
        Ok(())
    }

    pub fn items_total(&self) -> i64 {
        self.items.iter().fold(0i64, |acc, i| acc.saturating_add(i.line_total()))
    }

    /// Coupon first, then bonus; each step floors at zero.
    pub fn recalculate(&mut self, coupon: Option<&CouponDiscount>) {
        self.pre_total = self.items_total();
        let after_coupon = coupon.map_or(self.pre_total, |c| c.apply(self.pre_total));
        let bonus = self.applied_bonus_amount.unwrap_or(0);
        self.final_total = after_coupon.saturating_sub(bonus).max(0);
    }

    pub fn stamp_order(&mut self, order_id: OrderId) {
        self.order_id = Some(order_id);
        self.touch();
    }

    /// Back to open after a failed payment; items are left alone.
    pub fn release_order(&mut self) {
        if !self.is_ordered {
            self.order_id = None;
            self.touch();
        }
    }

    pub fn mark_ordered(&mut self) {
        self.is_ordered = true;
        self.touch();
    }

    fn ensure_mutable(&self) -> Result<(), CartError> {
        if self.is_ordered { Err(CartError::AlreadyOrdered) } else { Ok(()) }
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum CartError { AlreadyOrdered, InvalidQuantity }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyOrdered => write!(f, "Cart is already ordered"),
            Self::InvalidQuantity => write!(f, "Quantity must be at least 1"),
        }
    }
}
