//! Delivery cost quotes from the carrier's pricing API.
//!
//! Quotes are cached for ten minutes per `(city, weight, declared value)`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, instrument};
use validator::Validate;

use crate::config::DeliveryConfig;
use crate::{EcommerceError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const QUOTE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliveryQuoteRequest {
    #[validate(length(min = 1, max = 128))]
    pub city: String,
    pub weight: Decimal,
    /// Declared parcel value, used by the carrier for insurance.
    pub declared_value: Option<i64>,
}

impl DeliveryQuoteRequest {
    fn cache_key(&self) -> String {
        format!("{}|{}|{}", self.city.trim().to_lowercase(), self.weight.normalize(), self.declared_value.unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryQuote {
    pub city: String,
    pub weight: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Deserialize)]
struct CarrierResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<CarrierPrice>,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CarrierPrice {
    #[serde(rename = "Cost")]
    cost: Decimal,
}

#[derive(Clone)]
pub struct DeliveryService {
    inner: Arc<DeliveryServiceInner>,
}

struct DeliveryServiceInner {
    client: reqwest::Client,
    config: DeliveryConfig,
    cache: Cache<String, DeliveryQuote>,
}

impl DeliveryService {
    pub fn new(config: DeliveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EcommerceError::ExternalService(format!("delivery client: {e}")))?;
        let cache = Cache::builder().max_capacity(10_000).time_to_live(QUOTE_TTL).build();
        Ok(Self { inner: Arc::new(DeliveryServiceInner { client, config, cache }) })
    }

    #[instrument(skip(self, req), fields(city = %req.city, weight = %req.weight))]
    pub async fn quote(&self, req: DeliveryQuoteRequest) -> Result<DeliveryQuote> {
        req.validate()?;
        if req.weight <= Decimal::ZERO {
            return Err(EcommerceError::Validation("weight must be positive".into()));
        }
        let key = req.cache_key();
        if let Some(hit) = self.inner.cache.get(&key).await {
            debug!("delivery quote cache hit");
            return Ok(hit);
        }

        let quote = self.fetch(&req).await?;
        self.inner.cache.insert(key, quote.clone()).await;
        Ok(quote)
    }

    async fn fetch(&self, req: &DeliveryQuoteRequest) -> Result<DeliveryQuote> {
        let payload = json!({
            "apiKey": self.inner.config.api_key.expose_secret(),
            "modelName": "InternetDocument",
            "calledMethod": "getDocumentPrice",
            "methodProperties": {
                "CityRecipient": req.city.trim(),
                "Weight": req.weight,
                "Cost": req.declared_value.unwrap_or(0),
                "ServiceType": "WarehouseWarehouse",
                "CargoType": "Parcel",
                "SeatsAmount": 1,
            },
        });
        let upstream = |message: String| {
            error!(city = %req.city, weight = %req.weight, declared_value = ?req.declared_value, error = %message, "delivery quote failed");
            EcommerceError::ExternalService(message)
        };

        let response = self.inner.client.post(&self.inner.config.api_url).json(&payload).send().await.map_err(|e| {
            if e.is_timeout() { upstream("delivery provider timed out".into()) } else { upstream(format!("delivery provider unreachable: {e}")) }
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| upstream(format!("delivery provider response: {e}")))?;
        if !status.is_success() {
            return Err(upstream(format!("delivery provider returned {status}: {}", body.chars().take(200).collect::<String>())));
        }

        let parsed: CarrierResponse = serde_json::from_str(&body).map_err(|e| upstream(format!("delivery provider response: {e}")))?;
        match parsed.data.first() {
            Some(price) if parsed.success => Ok(DeliveryQuote { city: req.city.trim().to_string(), weight: req.weight, cost: price.cost }),
            _ if !parsed.errors.is_empty() => Err(upstream(parsed.errors.join("; "))),
            _ => Err(upstream("delivery provider returned no price".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{http::StatusCode, routing::post, Json, Router};
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    fn request(city: &str, weight: Decimal) -> DeliveryQuoteRequest {
        DeliveryQuoteRequest { city: city.into(), weight, declared_value: None }
    }

    /// Serves `router` on an ephemeral port and returns its URL.
    async fn carrier(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/")
    }

    fn service(api_url: String) -> DeliveryService {
        DeliveryService::new(DeliveryConfig { api_url, api_key: SecretString::from("key".to_string()) }).unwrap()
    }

    #[test]
    fn test_cache_key_normalizes_city_and_weight() {
        assert_eq!(request(" Kyiv ", dec!(1.50)).cache_key(), request("kyiv", dec!(1.5)).cache_key());
        assert_ne!(request("Kyiv", dec!(1.5)).cache_key(), request("Lviv", dec!(1.5)).cache_key());
    }

    #[tokio::test]
    async fn test_quote_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route("/", post(move |Json(body): Json<serde_json::Value>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(body["methodProperties"]["CityRecipient"], "Kyiv");
                Json(json!({ "success": true, "data": [{ "Cost": 85 }], "errors": [] }))
            }
        }));
        let svc = service(carrier(router).await);

        let first = svc.quote(request("Kyiv", dec!(2))).await.unwrap();
        assert_eq!(first.cost, dec!(85));
        let second = svc.quote(request("Kyiv", dec!(2))).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_message() {
        let router = Router::new().route("/", post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "carrier maintenance") }));
        let svc = service(carrier(router).await);
        let err = svc.quote(request("Kyiv", dec!(1))).await.unwrap_err();
        match err {
            EcommerceError::ExternalService(msg) => assert!(msg.contains("carrier maintenance")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_carrier_errors_are_reported() {
        let router = Router::new().route("/", post(|| async { Json(json!({ "success": false, "data": [], "errors": ["City not found"] })) }));
        let svc = service(carrier(router).await);
        let err = svc.quote(request("Atlantis", dec!(1))).await.unwrap_err();
        assert_eq!(err.to_string(), "External service error: City not found");
    }

    #[tokio::test]
    async fn test_non_positive_weight_rejected() {
        let svc = service("http://127.0.0.1:9/".into());
        assert!(matches!(svc.quote(request("Kyiv", dec!(0))).await, Err(EcommerceError::Validation(_))));
    }
}
