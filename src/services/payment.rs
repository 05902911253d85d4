//! Checkout and payment-provider reconciliation.
//!
//! Checkout stamps the cart with a fresh order id, stores a pending
//! [`Payment`] and hands the client a base64 payload plus signature for the
//! provider's checkout page. The provider later posts the same pair back to
//! the callback endpoint; the signature is
//! `base64(sha256(private_key + data + private_key))`.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::PaymentConfig;
use crate::domain::aggregates::{Cart, Payment, PaymentStatus};
use crate::domain::events::{CartEvent, DomainEvent, PaymentEvent};
use crate::domain::value_objects::{OrderId, Owner};
use crate::repository::Store;
use crate::services::cart::CartService;
use crate::services::loyalty::LoyaltyService;
use crate::services::notify::{Email, EventPublisher, Mailer};
use crate::{EcommerceError, Result};

const PROVIDER_API_VERSION: u8 = 3;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[serde(default = "default_payment_method")]
    #[validate(length(min = 1, max = 32))]
    pub payment_method: String,
    #[validate(email)]
    pub email: Option<String>,
    pub contact_info: Option<serde_json::Value>,
}

fn default_payment_method() -> String { "card".to_string() }

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self { payment_method: default_payment_method(), email: None, contact_info: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub payment_id: Uuid,
    pub order_id: OrderId,
    pub amount: i64,
    pub currency: String,
    pub data: String,
    pub signature: String,
    pub checkout_url: String,
}

/// Body the provider posts back.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    pub data: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
struct ProviderRequest<'a> {
    version: u8,
    public_key: &'a str,
    action: &'static str,
    amount: i64,
    currency: &'a str,
    description: String,
    order_id: &'a str,
    result_url: &'a str,
    server_url: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ProviderNotice {
    order_id: String,
    status: String,
    #[serde(default)]
    transaction_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "status", rename_all = "snake_case")]
pub enum CallbackOutcome {
    Processed(PaymentStatus),
    AlreadySettled,
    UnknownOrder,
}

/// Signs and verifies provider payloads.
#[derive(Clone)]
pub struct PaymentSigner {
    private_key: SecretString,
}

impl PaymentSigner {
    pub fn new(private_key: SecretString) -> Self { Self { private_key } }

    pub fn sign(&self, data: &str) -> String {
        let key = self.private_key.expose_secret();
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(data.as_bytes());
        hasher.update(key.as_bytes());
        BASE64.encode(hasher.finalize())
    }

    pub fn verify(&self, data: &str, signature: &str) -> bool {
        constant_time_eq(self.sign(data).as_bytes(), signature.trim().as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
    carts: CartService,
    loyalty: LoyaltyService,
    signer: PaymentSigner,
    config: PaymentConfig,
    mailer: Arc<dyn Mailer>,
    events: EventPublisher,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn Store>,
        carts: CartService,
        loyalty: LoyaltyService,
        config: PaymentConfig,
        mailer: Arc<dyn Mailer>,
        events: EventPublisher,
    ) -> Self {
        let signer = PaymentSigner::new(config.private_key.clone());
        Self { store, carts, loyalty, signer, config, mailer, events }
    }

    pub fn signer(&self) -> &PaymentSigner { &self.signer }

    #[instrument(skip(self, req), fields(owner = %owner))]
    pub async fn create(&self, owner: &Owner, req: CheckoutRequest) -> Result<CheckoutSession> {
        req.validate()?;
        let mut cart = self.carts.get_or_create_cart(owner).await?;
        if cart.is_empty() {
            return Err(EcommerceError::Validation("cart is empty".into()));
        }
        if let Some(email) = &req.email {
            cart.email = Some(email.clone());
        }
        self.carts.recalculate_totals(&mut cart).await?;
        if cart.final_total <= 0 {
            return Err(EcommerceError::Validation("nothing to pay".into()));
        }

        let order_id = OrderId::generate();
        cart.stamp_order(order_id.clone());
        self.store.save_cart(&cart).await?;

        let mut payment = Payment::pending(cart.id, owner.user_id(), order_id.clone(), cart.final_total, &self.config.currency, req.payment_method);
        payment.contact_info = req.contact_info;
        self.store.insert_payment(&payment).await?;

        let (data, signature) = self.encode_request(&payment)?;
        info!(order_id = %order_id, amount = payment.amount, "checkout started");

        self.events.publish(DomainEvent::Payment(PaymentEvent::Created {
            order_id: order_id.to_string(), cart_id: cart.id, amount: payment.amount,
        })).await;
        self.send_confirmation(&cart, &payment).await;

        Ok(CheckoutSession {
            payment_id: payment.id, order_id, amount: payment.amount, currency: payment.currency,
            data, signature, checkout_url: self.config.checkout_url.clone(),
        })
    }

    /// Applies a provider notification. Anything past the signature check is
    /// acknowledged so the provider stops retrying.
    #[instrument(skip(self, data, signature))]
    pub async fn handle_callback(&self, data: &str, signature: &str) -> Result<CallbackOutcome> {
        if !self.signer.verify(data, signature) {
            if self.config.skip_signature {
                warn!("callback signature mismatch ignored; signature checks are disabled");
            } else {
                warn!("callback rejected: invalid signature");
                return Err(EcommerceError::Validation("invalid signature".into()));
            }
        }

        let decoded = BASE64.decode(data.trim())
            .map_err(|_| EcommerceError::Validation("malformed callback data".into()))?;
        let notice: ProviderNotice = serde_json::from_slice(&decoded)
            .map_err(|e| EcommerceError::Validation(format!("malformed callback data: {e}")))?;

        let Some(mut payment) = self.store.find_payment_by_order(&notice.order_id).await? else {
            warn!(order_id = %notice.order_id, "callback for unknown order");
            return Ok(CallbackOutcome::UnknownOrder);
        };
        if payment.is_settled() {
            info!(order_id = %notice.order_id, status = payment.status.as_str(), "duplicate callback for settled payment");
            return Ok(CallbackOutcome::AlreadySettled);
        }

        let status = PaymentStatus::from_provider(&notice.status);
        let transaction_id = notice.transaction_id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        payment.settle(status, transaction_id)
            .map_err(|e| EcommerceError::Conflict(e.to_string()))?;
        self.store.save_payment(&payment).await?;
        info!(order_id = %payment.order_id, status = status.as_str(), provider_status = %notice.status, "payment settled");

        match status {
            PaymentStatus::Completed => {
                self.finalize_order(&payment).await;
                self.events.publish(DomainEvent::Payment(PaymentEvent::Completed {
                    order_id: payment.order_id.to_string(), cart_id: payment.cart_id,
                    amount: payment.amount, transaction_id: payment.transaction_id.clone(),
                })).await;
            }
            _ => {
                self.reopen_cart(&payment).await;
                self.events.publish(DomainEvent::Payment(PaymentEvent::Failed {
                    order_id: payment.order_id.to_string(), cart_id: payment.cart_id,
                })).await;
            }
        }
        Ok(CallbackOutcome::Processed(status))
    }

    pub async fn get_payment(&self, order_id: &str) -> Result<Payment> {
        self.store.find_payment_by_order(order_id).await?.ok_or_else(|| EcommerceError::not_found("payment"))
    }

    /// Looks up a payment on behalf of the cart's owner; other owners see NotFound.
    pub async fn get_payment_for(&self, owner: &Owner, order_id: &str) -> Result<Payment> {
        let payment = self.get_payment(order_id).await?;
        let owned = match self.store.find_cart(payment.cart_id).await? {
            Some(cart) => cart.owner == *owner,
            None => payment.user_id.is_some() && payment.user_id == owner.user_id(),
        };
        if !owned {
            return Err(EcommerceError::not_found("payment"));
        }
        Ok(payment)
    }

    fn encode_request(&self, payment: &Payment) -> Result<(String, String)> {
        let request = ProviderRequest {
            version: PROVIDER_API_VERSION,
            public_key: &self.config.public_key,
            action: "pay",
            amount: payment.amount,
            currency: &payment.currency,
            description: format!("Order {}", payment.order_id),
            order_id: payment.order_id.as_str(),
            result_url: &self.config.result_url,
            server_url: &self.config.server_url,
        };
        let json = serde_json::to_vec(&request).map_err(|e| EcommerceError::Storage(e.to_string()))?;
        let data = BASE64.encode(json);
        let signature = self.signer.sign(&data);
        Ok((data, signature))
    }

    async fn finalize_order(&self, payment: &Payment) {
        let mut cart = match self.store.find_cart(payment.cart_id).await {
            Ok(Some(cart)) => cart,
            Ok(None) => {
                error!(order_id = %payment.order_id, cart_id = %payment.cart_id, "paid order has no cart");
                return;
            }
            Err(e) => {
                error!(order_id = %payment.order_id, error = %e, "failed to load cart for paid order");
                return;
            }
        };
        if cart.is_ordered || cart.order_id.as_ref() != Some(&payment.order_id) {
            warn!(order_id = %payment.order_id, cart_order_id = ?cart.order_id, is_ordered = cart.is_ordered, "paid order no longer owns its cart; cart left as is");
            return;
        }
        cart.mark_ordered();
        if let Err(e) = self.store.save_cart(&cart).await {
            error!(order_id = %payment.order_id, error = %e, "failed to mark cart ordered");
            return;
        }
        self.events.publish(DomainEvent::Cart(CartEvent::Ordered { cart_id: cart.id, order_id: payment.order_id.to_string() })).await;

        let Some(user_id) = cart.owner.user_id() else { return };
        if cart.items.is_empty() {
            return;
        }
        let amount = cart.items_total();
        let posted = self.loyalty
            .add_order_to_history(user_id, payment.order_id.as_str(), cart.items.clone(), amount, Utc::now(), Some(format!("Order {}", payment.order_id)))
            .await;
        if let Err(e) = posted {
            error!(order_id = %payment.order_id, %user_id, error = %e, "failed to post order to purchase history");
        }
    }

    async fn reopen_cart(&self, payment: &Payment) {
        match self.store.find_cart(payment.cart_id).await {
            Ok(Some(mut cart)) if cart.order_id.as_ref() == Some(&payment.order_id) => {
                cart.release_order();
                if let Err(e) = self.store.save_cart(&cart).await {
                    error!(order_id = %payment.order_id, error = %e, "failed to reopen cart");
                }
            }
            Ok(_) => {}
            Err(e) => error!(order_id = %payment.order_id, error = %e, "failed to load cart for failed payment"),
        }
    }

    async fn send_confirmation(&self, cart: &Cart, payment: &Payment) {
        let Some(to) = cart.email.clone() else { return };
        let email = Email {
            to,
            subject: format!("Order {} received", payment.order_id),
            body: format!("We have received your order {} for {} {}. It will be confirmed once payment completes.", payment.order_id, payment.amount, payment.currency),
        };
        if let Err(e) = self.mailer.send(email).await {
            warn!(order_id = %payment.order_id, error = %e, "order confirmation email failed");
        }
    }
}
