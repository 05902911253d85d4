use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use crate::domain::aggregates::Cart;
use crate::http::{AppState, OwnerCtx};
use crate::services::cart::{AddItemRequest, RemoveItemRequest};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct CouponBody {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct BonusBody {
    pub amount: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailBody {
    #[validate(email)]
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/add", post(add_item))
        .route("/cart/remove", post(remove_item))
        .route("/cart/clear", post(clear_cart))
        .route("/cart/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/cart/bonus", post(apply_bonus))
        .route("/cart/email", post(set_email))
}

async fn get_cart(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx) -> Result<Json<Cart>> {
    s.carts.get_or_create_cart(&owner).await.map(Json)
}

async fn add_item(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(req): Json<AddItemRequest>) -> Result<Json<Cart>> {
    s.carts.add_item(&owner, req).await.map(Json)
}

async fn remove_item(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(req): Json<RemoveItemRequest>) -> Result<Json<Cart>> {
    s.carts.remove_item(&owner, req).await.map(Json)
}

async fn clear_cart(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx) -> Result<Json<Cart>> {
    s.carts.clear_cart(&owner).await.map(Json)
}

async fn apply_coupon(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(body): Json<CouponBody>) -> Result<Json<Cart>> {
    s.carts.apply_coupon(&owner, body.code.trim()).await.map(Json)
}

async fn remove_coupon(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx) -> Result<Json<Cart>> {
    s.carts.remove_coupon(&owner).await.map(Json)
}

async fn apply_bonus(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(body): Json<BonusBody>) -> Result<Json<Cart>> {
    s.carts.apply_bonus(&owner, body.amount).await.map(Json)
}

async fn set_email(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(body): Json<EmailBody>) -> Result<Json<Cart>> {
    body.validate()?;
    s.carts.set_email(&owner, body.email).await.map(Json)
}
