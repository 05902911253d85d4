//! Cart operations for users and guests.
//!
//! Each owner has at most one open cart; it is created on first access. Line
//! prices are captured when an item is added, totals are recomputed when a
//! coupon or bonus is applied and again at checkout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Cart, CartError, LinePrice};
use crate::domain::value_objects::{ItemOptions, Owner};
use crate::repository::Store;
use crate::services::coupon::CouponService;
use crate::{EcommerceError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: Option<u32>,
    #[serde(flatten)]
    pub options: ItemOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    #[serde(flatten)]
    pub options: ItemOptions,
}

impl From<CartError> for EcommerceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::AlreadyOrdered => Self::Conflict(err.to_string()),
            CartError::InvalidQuantity => Self::Validation(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
    coupons: CouponService,
}

impl CartService {
    pub fn new(store: Arc<dyn Store>, coupons: CouponService) -> Self { Self { store, coupons } }

    /// Finds the owner's open cart, creating an empty one if there is none.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn get_or_create_cart(&self, owner: &Owner) -> Result<Cart> {
        if let Some(cart) = self.store.find_open_cart(owner).await? {
            return Ok(cart);
        }
        let cart = self.store.create_open_cart(&Cart::new(owner.clone())).await?;
        info!(cart_id = %cart.id, "cart created");
        Ok(cart)
    }

    #[instrument(skip(self, req), fields(owner = %owner, product_id = %req.product_id))]
    pub async fn add_item(&self, owner: &Owner, req: AddItemRequest) -> Result<Cart> {
        req.validate()?;
        let mut cart = self.get_or_create_cart(owner).await?;
        let product = self.store.find_product(req.product_id).await?
            .ok_or_else(|| EcommerceError::not_found("product"))?;
        let price = LinePrice::for_product(&product, Utc::now());
        cart.add_item(product.id, req.quantity.unwrap_or(1), req.options, price)?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    #[instrument(skip(self, req), fields(owner = %owner, product_id = %req.product_id))]
    pub async fn remove_item(&self, owner: &Owner, req: RemoveItemRequest) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(owner).await?;
        if cart.remove_item(req.product_id, &req.options)? {
            self.store.save_cart(&cart).await?;
        }
        Ok(cart)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn clear_cart(&self, owner: &Owner) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(owner).await?;
        cart.clear()?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Recomputes `pre_total`/`final_total`. Fails without touching the cart
    /// when the applied coupon is missing or no longer valid.
    pub async fn recalculate_totals(&self, cart: &mut Cart) -> Result<()> {
        self.recalculate_totals_at(cart, Utc::now()).await
    }

    pub async fn recalculate_totals_at(&self, cart: &mut Cart, now: DateTime<Utc>) -> Result<()> {
        let coupon = match cart.applied_coupon_code.as_deref() {
            Some(code) => Some(self.coupons.find_valid_coupon_at(code, now).await?),
            None => None,
        };
        cart.recalculate(coupon.as_ref().map(|c| &c.discount));
        Ok(())
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn apply_coupon(&self, owner: &Owner, code: &str) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(owner).await?;
        let coupon = self.coupons.find_valid_coupon(code).await?;
        cart.applied_coupon_code = Some(coupon.code);
        self.recalculate_totals(&mut cart).await?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Detaches the applied coupon, if any, and recomputes totals without it.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn remove_coupon(&self, owner: &Owner) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(owner).await?;
        if let Some(code) = cart.applied_coupon_code.take() {
            info!(cart_id = %cart.id, %code, "coupon removed");
        }
        self.recalculate_totals(&mut cart).await?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn apply_bonus(&self, owner: &Owner, amount: i64) -> Result<Cart> {
        if amount < 0 {
            return Err(EcommerceError::Validation("bonus amount must not be negative".into()));
        }
        if let Some(user_id) = owner.user_id() {
            let balance = self.store.find_account(user_id).await?.map_or(0, |a| a.bonus_balance);
            if amount > balance {
                return Err(EcommerceError::Validation("insufficient bonus balance".into()));
            }
        }
        let mut cart = self.get_or_create_cart(owner).await?;
        cart.applied_bonus_amount = (amount > 0).then_some(amount);
        self.recalculate_totals(&mut cart).await?;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    pub async fn set_email(&self, owner: &Owner, email: String) -> Result<Cart> {
        let mut cart = self.get_or_create_cart(owner).await?;
        cart.email = Some(email);
        cart.reminder_sent = false;
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }
}
