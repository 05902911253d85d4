//! Loyalty accounts, levels and purchase history

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::cart::CartItem;
use crate::domain::value_objects::round_amount;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyLevel {
    pub id: Uuid,
    pub name: String,
    /// Share of each purchase credited as bonus, in percent.
    pub bonus_percent: Decimal,
}

impl LoyaltyLevel {
    pub fn create(name: impl Into<String>, bonus_percent: Decimal) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), bonus_percent }
    }

    pub fn bonus_for(&self, amount: i64) -> i64 {
        round_amount(Decimal::from(amount) * self.bonus_percent / Decimal::from(100)).max(0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level_id: Option<Uuid>,
    pub total_amount: i64,
    pub bonus_balance: i64,
    pub card_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyAccount {
    pub fn open(user_id: Uuid, level_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), user_id, level_id, total_amount: 0, bonus_balance: 0, card_number: None, created_at: now, updated_at: now }
    }

    /// Adds a purchase to the running total and credits the level's bonus. Returns the bonus credited.
    pub fn accrue(&mut self, amount: i64, level: Option<&LoyaltyLevel>) -> i64 {
        let bonus = level.map_or(0, |l| l.bonus_for(amount));
        self.total_amount = self.total_amount.saturating_add(amount);
        self.bonus_balance = self.bonus_balance.saturating_add(bonus);
        self.touch();
        bonus
    }

    pub fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// One completed order. Never changed once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub amount: i64,
    pub items: Vec<CartItem>,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accrue_with_level() {
        let gold = LoyaltyLevel::create("Gold", dec!(5));
        let mut account = LoyaltyAccount::open(Uuid::new_v4(), Some(gold.id));
        assert_eq!(account.accrue(1000, Some(&gold)), 50);
        assert_eq!(account.accrue(30, Some(&gold)), 2); // 1.5 rounds up
        assert_eq!((account.total_amount, account.bonus_balance), (1030, 52));
    }

    #[test]
    fn test_accrue_without_level_only_counts_total() {
        let mut account = LoyaltyAccount::open(Uuid::new_v4(), None);
        assert_eq!(account.accrue(400, None), 0);
        assert_eq!((account.total_amount, account.bonus_balance), (400, 0));
    }

    #[test]
    fn test_accrue_saturates_running_totals() {
        let gold = LoyaltyLevel::create("Gold", dec!(5));
        let mut account = LoyaltyAccount::open(Uuid::new_v4(), Some(gold.id));
        account.total_amount = i64::MAX - 10;
        account.bonus_balance = i64::MAX - 1;
        account.accrue(1000, Some(&gold));
        assert_eq!((account.total_amount, account.bonus_balance), (i64::MAX, i64::MAX));
    }
}
