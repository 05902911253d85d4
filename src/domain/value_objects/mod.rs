//! Value Objects for the shop

use chrono::Utc;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Whoever holds a cart: a signed-in user or a guest session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    User(Uuid),
    Guest(String),
}

impl Owner {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Guest(_) => "guest",
        }
    }

    pub fn key(&self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::Guest(id) => id.clone(),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// Rebuilds an owner from its stored `(kind, key)` pair.
    pub fn from_parts(kind: &str, key: &str) -> Option<Self> {
        match kind {
            "user" => Uuid::parse_str(key).ok().map(Self::User),
            "guest" => Some(Self::Guest(key.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.kind(), self.key()) }
}

/// Options distinguishing two lines of the same product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemOptions {
    pub size: Option<String>,
    pub material: Option<String>,
    pub insert: Option<String>,
}

/// Order identifier handed to the payment provider: `<6 base36 chars>-<unix millis>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

impl OrderId {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let prefix: String = (0..6).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect();
        Self(format!("{}-{}", prefix, Utc::now().timestamp_millis()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self { Self(value) }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Rounds to whole currency units, halves away from zero.
pub fn round_amount(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_parts_round_trip() {
        let user = Owner::User(Uuid::new_v4());
        assert_eq!(Owner::from_parts(user.kind(), &user.key()), Some(user.clone()));
        assert_eq!(Owner::from_parts("guest", "sess-1"), Some(Owner::Guest("sess-1".into())));
        assert_eq!(Owner::from_parts("robot", "x"), None);
        assert_eq!(Owner::from_parts("user", "not-a-uuid"), None);
    }

    #[test]
    fn test_order_id_shape() {
        let id = OrderId::generate();
        let (prefix, millis) = id.as_str().split_once('-').unwrap();
        assert_eq!(prefix.len(), 6);
        assert!(prefix.bytes().all(|b| BASE36.contains(&b)));
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert_ne!(OrderId::generate(), id);
    }

    #[test]
    fn test_round_amount_half_up() {
        assert_eq!(round_amount(Decimal::new(1005, 1)), 101);
        assert_eq!(round_amount(Decimal::new(1004, 1)), 100);
        assert_eq!(round_amount(Decimal::new(180, 0)), 180);
    }
}
