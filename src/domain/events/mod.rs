//! Domain events
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Payment(PaymentEvent),
    Cart(CartEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PaymentEvent {
    Created { order_id: String, cart_id: Uuid, amount: i64 },
    Completed { order_id: String, cart_id: Uuid, amount: i64, transaction_id: Option<String> },
    Failed { order_id: String, cart_id: Uuid },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CartEvent {
    Ordered { cart_id: Uuid, order_id: String },
    ReminderSent { cart_id: Uuid },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Payment(PaymentEvent::Created { .. }) => "shop.payment.created",
            Self::Payment(PaymentEvent::Completed { .. }) => "shop.payment.completed",
            Self::Payment(PaymentEvent::Failed { .. }) => "shop.payment.failed",
            Self::Cart(CartEvent::Ordered { .. }) => "shop.cart.ordered",
            Self::Cart(CartEvent::ReminderSent { .. }) => "shop.cart.reminder_sent",
        }
    }
}
