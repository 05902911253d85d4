//! Payment Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::OrderId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub cart_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub order_id: OrderId,
    pub contact_info: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Completed, Failed }

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed" }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Maps the provider's status string; only `success` counts as paid.
    pub fn from_provider(status: &str) -> Self {
        if status == "success" { Self::Completed } else { Self::Failed }
    }
}

impl Payment {
    pub fn pending(cart_id: Uuid, user_id: Option<Uuid>, order_id: OrderId, amount: i64, currency: &str, payment_method: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), user_id, cart_id, amount, currency: currency.to_string(),
            status: PaymentStatus::Pending, payment_method: payment_method.into(), transaction_id: None,
            order_id, contact_info: None, created_at: now, updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool { self.status == PaymentStatus::Completed }

    pub fn is_settled(&self) -> bool { self.status != PaymentStatus::Pending }

    /// Records the provider's verdict. Settling happens once; completed and
    /// failed are both final.
    pub fn settle(&mut self, status: PaymentStatus, transaction_id: Option<String>) -> Result<(), PaymentError> {
        if self.is_settled() { return Err(PaymentError::AlreadySettled); }
        if status == PaymentStatus::Pending { return Err(PaymentError::NotAVerdict); }
        self.status = status;
        if transaction_id.is_some() { self.transaction_id = transaction_id; }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PaymentError { AlreadySettled, NotAVerdict }
impl std::error::Error for PaymentError {}
impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadySettled => write!(f, "Payment already settled"),
            Self::NotAVerdict => write!(f, "Pending is not a settlement status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_workflow() {
        let mut p = Payment::pending(Uuid::new_v4(), None, OrderId::generate(), 150, "UAH", "card");
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.settle(PaymentStatus::Pending, None), Err(PaymentError::NotAVerdict));
        p.settle(PaymentStatus::Completed, Some("tx-2".into())).unwrap();
        assert!(p.is_completed());
        assert_eq!(p.settle(PaymentStatus::Failed, None), Err(PaymentError::AlreadySettled));
        assert_eq!(p.transaction_id.as_deref(), Some("tx-2"));
    }

    #[test]
    fn test_failed_payment_is_final() {
        let mut p = Payment::pending(Uuid::new_v4(), None, OrderId::generate(), 150, "UAH", "card");
        p.settle(PaymentStatus::Failed, Some("tx-1".into())).unwrap();
        assert!(p.is_settled());
        assert_eq!(p.settle(PaymentStatus::Completed, Some("tx-3".into())), Err(PaymentError::AlreadySettled));
        assert_eq!(p.status, PaymentStatus::Failed);
        assert_eq!(p.transaction_id.as_deref(), Some("tx-1"));
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(PaymentStatus::from_provider("success"), PaymentStatus::Completed);
        assert_eq!(PaymentStatus::from_provider("failure"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::from_provider("sandbox"), PaymentStatus::Failed);
        assert_eq!(PaymentStatus::parse(PaymentStatus::Completed.as_str()), Some(PaymentStatus::Completed));
    }
}
