//! HTTP surface: shared state, identity extractors and the `/api/v1` router.

pub mod auth;
pub mod error;
mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{DeliveryConfig, PaymentConfig};
use crate::repository::Store;
use crate::services::notify::{EventPublisher, Mailer};
use crate::services::{
    CartService, CatalogService, CouponService, DeliveryService, LoyaltyService, PaymentService, UserService,
};
use crate::Result;

pub use auth::{AdminCtx, JwtKeys, OwnerCtx, Role, UserCtx};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub carts: CartService,
    pub coupons: CouponService,
    pub loyalty: LoyaltyService,
    pub payments: PaymentService,
    pub delivery: DeliveryService,
    pub users: UserService,
    pub auth: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_secret: &SecretString,
        payment: PaymentConfig,
        delivery: DeliveryConfig,
        mailer: Arc<dyn Mailer>,
        events: EventPublisher,
    ) -> Result<Self> {
        let coupons = CouponService::new(store.clone());
        let carts = CartService::new(store.clone(), coupons.clone());
        let loyalty = LoyaltyService::new(store.clone());
        let payments = PaymentService::new(store.clone(), carts.clone(), loyalty.clone(), payment, mailer, events);
        Ok(Self {
            catalog: CatalogService::new(store.clone()),
            carts,
            coupons,
            loyalty,
            payments,
            delivery: DeliveryService::new(delivery)?,
            users: UserService::new(store),
            auth: Arc::new(JwtKeys::new(jwt_secret)),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::catalog::router())
        .merge(routes::cart::router())
        .merge(routes::payment::router())
        .merge(routes::coupon::router())
        .merge(routes::loyalty::router())
        .merge(routes::delivery::router())
        .merge(routes::users::router());

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy", "service": "shop-backend" })) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
