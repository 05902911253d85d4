use axum::async_trait;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

use crate::domain::aggregates::Payment;
use crate::http::{AppState, OwnerCtx};
use crate::services::payment::{CallbackRequest, CheckoutRequest, CheckoutSession};
use crate::{EcommerceError, Result};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment/create", post(create_payment))
        .route("/payment/callback", post(payment_callback))
        .route("/payment/:order_id", get(get_payment))
}

/// Provider callbacks arrive form-encoded; JSON is accepted as well.
pub struct CallbackBody(pub CallbackRequest);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for CallbackBody {
    type Rejection = EcommerceError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
        let body = if is_form {
            Form::<CallbackRequest>::from_request(req, state).await.map(|Form(b)| b).map_err(|e| EcommerceError::Validation(e.body_text()))?
        } else {
            Json::<CallbackRequest>::from_request(req, state).await.map(|Json(b)| b).map_err(|e| EcommerceError::Validation(e.body_text()))?
        };
        Ok(Self(body))
    }
}

async fn create_payment(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Json(req): Json<CheckoutRequest>) -> Result<(StatusCode, Json<CheckoutSession>)> {
    let session = s.payments.create(&owner, req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn payment_callback(State(s): State<AppState>, CallbackBody(body): CallbackBody) -> Result<Json<Value>> {
    let outcome = s.payments.handle_callback(&body.data, &body.signature).await?;
    Ok(Json(json!({ "status": "ok", "result": outcome })))
}

async fn get_payment(State(s): State<AppState>, OwnerCtx(owner): OwnerCtx, Path(order_id): Path<String>) -> Result<Json<Payment>> {
    s.payments.get_payment_for(&owner, &order_id).await.map(Json)
}
