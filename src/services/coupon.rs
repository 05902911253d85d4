//! Coupon lookup, validation and admin CRUD.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::aggregates::{Coupon, CouponDiscount};
use crate::repository::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub amount: Option<i64>,
    pub percent: Option<Decimal>,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

impl CreateCouponRequest {
    fn discount(&self) -> Result<CouponDiscount> {
        match (self.amount, self.percent) {
            (Some(amount), None) => Ok(CouponDiscount::Amount(amount)),
            (None, Some(percent)) if percent > Decimal::ZERO && percent <= Decimal::ONE => Ok(CouponDiscount::Percent(percent)),
            (None, Some(_)) => Err(EcommerceError::Validation("percent must be greater than 0 and at most 1".into())),
            _ => Err(EcommerceError::Validation("exactly one of amount or percent is required".into())),
        }
    }
}

#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn Store>,
}

impl CouponService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn find_valid_coupon(&self, code: &str) -> Result<Coupon> {
        self.find_valid_coupon_at(code, Utc::now()).await
    }

    pub async fn find_valid_coupon_at(&self, code: &str, now: DateTime<Utc>) -> Result<Coupon> {
        let coupon = self.get_coupon(code).await?;
        if !coupon.is_valid_at(now) {
            return Err(EcommerceError::Validation("coupon not valid".into()));
        }
        Ok(coupon)
    }

    pub async fn get_coupon(&self, code: &str) -> Result<Coupon> {
        self.store.find_coupon(code).await?.ok_or_else(|| EcommerceError::not_found("coupon"))
    }

    pub async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        Ok(self.store.list_coupons().await?)
    }

    #[instrument(skip(self, req), fields(code = %req.code))]
    pub async fn create_coupon(&self, req: CreateCouponRequest) -> Result<Coupon> {
        req.validate()?;
        let discount = req.discount()?;
        if req.expiry_date < req.start_date {
            return Err(EcommerceError::Validation("expiry_date must not precede start_date".into()));
        }
        let coupon = Coupon::create(req.code.trim(), discount, req.start_date, req.expiry_date);
        self.store.insert_coupon(&coupon).await?;
        info!(code = %coupon.code, "coupon created");
        Ok(coupon)
    }

    pub async fn delete_coupon(&self, code: &str) -> Result<()> {
        if !self.store.delete_coupon(code).await? {
            return Err(EcommerceError::not_found("coupon"));
        }
        Ok(())
    }
}
