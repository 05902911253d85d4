//! End-to-end tests over the HTTP router with the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shop_backend::config::{DeliveryConfig, PaymentConfig};
use shop_backend::http::{self, AppState, JwtKeys, Role};
use shop_backend::repository::MemoryStore;
use shop_backend::services::notify::{EventPublisher, LogMailer};
use shop_backend::services::payment::PaymentSigner;

const JWT_SECRET: &str = "test-jwt-secret";
const PAYMENT_KEY: &str = "test-private-key";

struct TestApp {
    router: Router,
    keys: JwtKeys,
}

impl TestApp {
    fn new() -> Self {
        let jwt = SecretString::from(JWT_SECRET.to_string());
        let payment = PaymentConfig {
            public_key: "test-public".into(),
            private_key: SecretString::from(PAYMENT_KEY.to_string()),
            checkout_url: "https://pay.test/checkout".into(),
            result_url: "https://shop.test/result".into(),
            server_url: "https://shop.test/api/v1/payment/callback".into(),
            currency: "UAH".into(),
            skip_signature: false,
        };
        let delivery = DeliveryConfig { api_url: "http://127.0.0.1:9/".into(), api_key: SecretString::from(String::new()) };
        let state = AppState::new(Arc::new(MemoryStore::new()), &jwt, payment, delivery, Arc::new(LogMailer), EventPublisher::disabled()).unwrap();
        Self { router: http::router(state), keys: JwtKeys::new(&jwt) }
    }

    fn token(&self, role: Role) -> String {
        self.keys.issue(Uuid::new_v4(), role, chrono::Duration::minutes(10)).unwrap()
    }

    async fn send(&self, method: &str, uri: &str, auth: Auth<'_>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        req = match auth {
            Auth::None => req,
            Auth::Guest(id) => req.header("x-guest-id", id),
            Auth::Bearer(token) => req.header("authorization", format!("Bearer {token}")),
        };
        let req = match body {
            Some(body) => req.header("content-type", "application/json").body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        read(self.router.clone().oneshot(req).await.unwrap()).await
    }
}

enum Auth<'a> {
    None,
    Guest(&'a str),
    Bearer(&'a str),
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn provider_notice(order_id: &str, status: &str) -> (String, String) {
    let data = BASE64.encode(json!({ "order_id": order_id, "status": status, "transaction_id": 42 }).to_string());
    let signature = PaymentSigner::new(SecretString::from(PAYMENT_KEY.to_string())).sign(&data);
    (data, signature)
}

fn form_encode(value: &str) -> String {
    value.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D")
}

async fn seed_catalog(app: &TestApp) -> String {
    let admin = app.token(Role::Admin);
    let (status, product) = app
        .send("POST", "/api/v1/products", Auth::Bearer(&admin), Some(json!({ "name": "Silver ring", "price": 100, "sizes": ["17"] })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send("POST", "/api/v1/coupon", Auth::Bearer(&admin), Some(json!({
            "code": "TEN",
            "percent": "0.1",
            "start_date": "2020-01-01T00:00:00Z",
            "expiry_date": "2100-01-01T00:00:00Z",
        })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    product["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", Auth::None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_cart_requires_an_owner() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/api/v1/cart", Auth::None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "owner required");

    let (status, _) = app.send("GET", "/api/v1/cart", Auth::Bearer("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let app = TestApp::new();
    let user = app.token(Role::User);
    let (status, _) = app.send("POST", "/api/v1/products", Auth::Bearer(&user), Some(json!({ "name": "Ring", "price": 1 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send("DELETE", &format!("/api/v1/users/{}", Uuid::new_v4()), Auth::Guest("g"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guest_checkout_end_to_end() {
    let app = TestApp::new();
    let product_id = seed_catalog(&app).await;
    let guest = Auth::Guest("guest-session-1");

    let (status, cart) = app.send("POST", "/api/v1/cart/add", Auth::Guest("guest-session-1"), Some(json!({ "product_id": product_id, "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let (_, cart) = app.send("POST", "/api/v1/cart/coupon", Auth::Guest("guest-session-1"), Some(json!({ "code": "TEN" }))).await;
    assert_eq!(cart["final_total"], 180);
    let (_, cart) = app.send("POST", "/api/v1/cart/bonus", Auth::Guest("guest-session-1"), Some(json!({ "amount": 30 }))).await;
    assert_eq!(cart["final_total"], 150);

    let (status, session) = app.send("POST", "/api/v1/payment/create", guest, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["amount"], 150);
    let order_id = session["order_id"].as_str().unwrap().to_string();

    let (status, payment) = app.send("GET", &format!("/api/v1/payment/{order_id}"), Auth::Guest("guest-session-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["status"], "pending");

    let (data, signature) = provider_notice(&order_id, "success");
    let form = format!("data={}&signature={}", form_encode(&data), form_encode(&signature));
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/payment/callback")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let (status, ack) = read(app.router.clone().oneshot(req).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["status"], "ok");

    let (_, payment) = app.send("GET", &format!("/api/v1/payment/{order_id}"), Auth::Guest("guest-session-1"), None).await;
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["transaction_id"], "42");

    // The ordered cart is closed; the guest starts over with an empty one.
    let (_, cart) = app.send("GET", "/api/v1/cart", Auth::Guest("guest-session-1"), None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["is_ordered"], false);

    let (status, _) = app.send("GET", &format!("/api/v1/payment/{order_id}"), Auth::Guest("someone-else"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_paid_order_lands_in_history() {
    let app = TestApp::new();
    let product_id = seed_catalog(&app).await;
    let user = app.token(Role::User);

    app.send("POST", "/api/v1/cart/add", Auth::Bearer(&user), Some(json!({ "product_id": product_id, "quantity": 3, "size": "17" }))).await;
    let (_, session) = app.send("POST", "/api/v1/payment/create", Auth::Bearer(&user), Some(json!({ "email": "buyer@shop.test" }))).await;
    let order_id = session["order_id"].as_str().unwrap().to_string();

    let (data, signature) = provider_notice(&order_id, "success");
    let body = json!({ "data": data, "signature": signature });
    let (status, _) = app.send("POST", "/api/v1/payment/callback", Auth::None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, ack) = app.send("POST", "/api/v1/payment/callback", Auth::None, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["result"]["outcome"], "already_settled");

    let (status, history) = app.send("GET", "/api/v1/loyalty/history", Auth::Bearer(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["amount"], 300);
    assert_eq!(history[0]["order_id"], order_id.as_str());
}

#[tokio::test]
async fn test_tampered_callback_rejected() {
    let app = TestApp::new();
    let product_id = seed_catalog(&app).await;
    app.send("POST", "/api/v1/cart/add", Auth::Guest("g"), Some(json!({ "product_id": product_id }))).await;
    let (_, session) = app.send("POST", "/api/v1/payment/create", Auth::Guest("g"), Some(json!({}))).await;
    let order_id = session["order_id"].as_str().unwrap().to_string();

    let (data, _) = provider_notice(&order_id, "success");
    let (status, body) = app
        .send("POST", "/api/v1/payment/callback", Auth::None, Some(json!({ "data": data, "signature": "Zm9yZ2Vk" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid signature");

    let (_, payment) = app.send("GET", &format!("/api/v1/payment/{order_id}"), Auth::Guest("g"), None).await;
    assert_eq!(payment["status"], "pending");
}

#[tokio::test]
async fn test_coupon_can_be_detached() {
    let app = TestApp::new();
    let product_id = seed_catalog(&app).await;
    app.send("POST", "/api/v1/cart/add", Auth::Guest("g"), Some(json!({ "product_id": product_id, "quantity": 2 }))).await;
    let (_, cart) = app.send("POST", "/api/v1/cart/coupon", Auth::Guest("g"), Some(json!({ "code": "TEN" }))).await;
    assert_eq!(cart["final_total"], 180);

    let (status, cart) = app.send("DELETE", "/api/v1/cart/coupon", Auth::Guest("g"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["applied_coupon_code"], Value::Null);
    assert_eq!(cart["final_total"], 200);
}

#[tokio::test]
async fn test_bonus_needs_a_balance_for_users() {
    let app = TestApp::new();
    let user = app.token(Role::User);
    let (status, body) = app.send("POST", "/api/v1/cart/bonus", Auth::Bearer(&user), Some(json!({ "amount": 100 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient bonus balance");
}

#[tokio::test]
async fn test_unknown_coupon_and_empty_checkout() {
    let app = TestApp::new();
    let (status, body) = app.send("POST", "/api/v1/cart/coupon", Auth::Guest("g"), Some(json!({ "code": "NOPE" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "coupon not found");

    let (status, body) = app.send("POST", "/api/v1/payment/create", Auth::Guest("g"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");
}
