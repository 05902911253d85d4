use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::domain::aggregates::Coupon;
use crate::http::{AdminCtx, AppState};
use crate::services::coupon::CreateCouponRequest;
use crate::Result;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/coupon", post(create_coupon).get(list_coupons))
        .route("/coupon/:code", get(get_coupon).delete(delete_coupon))
}

async fn create_coupon(State(s): State<AppState>, _: AdminCtx, Json(req): Json<CreateCouponRequest>) -> Result<(StatusCode, Json<Coupon>)> {
    let coupon = s.coupons.create_coupon(req).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn list_coupons(State(s): State<AppState>, _: AdminCtx) -> Result<Json<Vec<Coupon>>> {
    s.coupons.list_coupons().await.map(Json)
}

async fn get_coupon(State(s): State<AppState>, Path(code): Path<String>) -> Result<Json<Coupon>> {
    s.coupons.get_coupon(&code).await.map(Json)
}

async fn delete_coupon(State(s): State<AppState>, _: AdminCtx, Path(code): Path<String>) -> Result<StatusCode> {
    s.coupons.delete_coupon(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
