use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::http::AppState;
use crate::services::delivery::{DeliveryQuote, DeliveryQuoteRequest};
use crate::Result;

pub fn router() -> Router<AppState> {
    Router::new().route("/delivery/cost", post(delivery_cost))
}

async fn delivery_cost(State(s): State<AppState>, Json(req): Json<DeliveryQuoteRequest>) -> Result<Json<DeliveryQuote>> {
    s.delivery.quote(req).await.map(Json)
}
