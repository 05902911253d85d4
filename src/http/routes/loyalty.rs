use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::aggregates::{LoyaltyAccount, LoyaltyLevel, PurchaseHistory};
use crate::http::{AdminCtx, AppState, UserCtx};
use crate::services::loyalty::{BonusBalance, CardRequest, LevelRequest, PurchaseRequest};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct AssignLevelBody {
    pub user_id: Uuid,
    pub level_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/loyalty/purchase", post(add_purchase))
        .route("/loyalty/history", get(get_history))
        .route("/loyalty/bonus", get(get_bonus))
        .route("/loyalty/card", post(add_card))
        .route("/loyalty/levels", get(list_levels).post(create_level))
        .route("/loyalty/levels/:id", put(update_level).delete(delete_level))
        .route("/loyalty/assign-level", post(assign_level))
}

async fn add_purchase(State(s): State<AppState>, UserCtx(user): UserCtx, Json(req): Json<PurchaseRequest>) -> Result<Json<LoyaltyAccount>> {
    s.loyalty.add_purchase(user, req).await.map(Json)
}

async fn get_history(State(s): State<AppState>, UserCtx(user): UserCtx) -> Result<Json<Vec<PurchaseHistory>>> {
    s.loyalty.get_history(user).await.map(Json)
}

async fn get_bonus(State(s): State<AppState>, UserCtx(user): UserCtx) -> Result<Json<BonusBalance>> {
    s.loyalty.get_bonus_balance(user).await.map(Json)
}

async fn add_card(State(s): State<AppState>, UserCtx(user): UserCtx, Json(req): Json<CardRequest>) -> Result<Json<LoyaltyAccount>> {
    s.loyalty.add_card(user, req).await.map(Json)
}

async fn list_levels(State(s): State<AppState>) -> Result<Json<Vec<LoyaltyLevel>>> {
    s.loyalty.get_levels().await.map(Json)
}

async fn create_level(State(s): State<AppState>, _: AdminCtx, Json(req): Json<LevelRequest>) -> Result<(StatusCode, Json<LoyaltyLevel>)> {
    let level = s.loyalty.create_level(req).await?;
    Ok((StatusCode::CREATED, Json(level)))
}

async fn update_level(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>, Json(req): Json<LevelRequest>) -> Result<Json<LoyaltyLevel>> {
    s.loyalty.update_level(id, req).await.map(Json)
}

async fn delete_level(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.loyalty.delete_level(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_level(State(s): State<AppState>, _: AdminCtx, Json(body): Json<AssignLevelBody>) -> Result<Json<LoyaltyAccount>> {
    s.loyalty.assign_level(body.user_id, body.level_id).await.map(Json)
}
