//! Loyalty ledger: bonus balances, levels and purchase history.
//!
//! Two ways to record a purchase exist and they are not interchangeable:
//! [`LoyaltyService::add_purchase`] accrues bonus and totals, while
//! [`LoyaltyService::add_order_to_history`] (the payment path) only appends
//! a history row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{CartItem, LoyaltyAccount, LoyaltyLevel, PurchaseHistory};
use crate::repository::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LevelRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub bonus_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PurchaseRequest {
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub amount: i64,
    pub order_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CardRequest {
    #[validate(length(min = 4, max = 32))]
    pub card_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BonusBalance {
    pub bonus_balance: i64,
    pub total_amount: i64,
    pub level: Option<LoyaltyLevel>,
}

#[derive(Clone)]
pub struct LoyaltyService {
    store: Arc<dyn Store>,
}

impl LoyaltyService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    /// Appends a history row; does not touch the account. Amounts `<= 0` are ignored.
    #[instrument(skip(self, items))]
    pub async fn add_order_to_history(
        &self,
        user_id: Uuid,
        order_id: &str,
        items: Vec<CartItem>,
        amount: i64,
        date: DateTime<Utc>,
        description: Option<String>,
    ) -> Result<Option<PurchaseHistory>> {
        if amount <= 0 {
            debug!(%user_id, order_id, "skipping empty order");
            return Ok(None);
        }
        let entry = PurchaseHistory { id: Uuid::now_v7(), user_id, order_id: order_id.to_string(), amount, items, date, description };
        self.store.append_history(&entry).await?;
        info!(%user_id, order_id, amount, "order added to history");
        Ok(Some(entry))
    }

    /// Records a purchase, accruing the level's bonus into the account.
    #[instrument(skip(self, req), fields(amount = req.amount))]
    pub async fn add_purchase(&self, user_id: Uuid, req: PurchaseRequest) -> Result<LoyaltyAccount> {
        req.validate()?;
        let mut account = self.account_or_open(user_id).await?;
        let level = match account.level_id {
            Some(id) => self.store.find_level(id).await?,
            None => None,
        };
        let bonus = account.accrue(req.amount, level.as_ref());
        self.store.save_account(&account).await?;

        let order_id = req.order_id.unwrap_or_else(|| format!("purchase-{}", Uuid::now_v7()));
        let entry = PurchaseHistory {
            id: Uuid::now_v7(), user_id, order_id, amount: req.amount, items: vec![], date: Utc::now(), description: req.description,
        };
        self.store.append_history(&entry).await?;
        info!(%user_id, bonus, balance = account.bonus_balance, "purchase recorded");
        Ok(account)
    }

    pub async fn get_history(&self, user_id: Uuid) -> Result<Vec<PurchaseHistory>> {
        Ok(self.store.list_history(user_id).await?)
    }

    pub async fn get_bonus_balance(&self, user_id: Uuid) -> Result<BonusBalance> {
        let account = self.get_account(user_id).await?;
        let level = match account.level_id {
            Some(id) => self.store.find_level(id).await?,
            None => None,
        };
        Ok(BonusBalance { bonus_balance: account.bonus_balance, total_amount: account.total_amount, level })
    }

    pub async fn get_account(&self, user_id: Uuid) -> Result<LoyaltyAccount> {
        self.store.find_account(user_id).await?.ok_or_else(|| EcommerceError::not_found("loyalty account"))
    }

    pub async fn add_card(&self, user_id: Uuid, req: CardRequest) -> Result<LoyaltyAccount> {
        req.validate()?;
        let mut account = self.get_account(user_id).await?;
        account.card_number = Some(req.card_number);
        account.touch();
        self.store.save_account(&account).await?;
        Ok(account)
    }

    pub async fn get_levels(&self) -> Result<Vec<LoyaltyLevel>> {
        Ok(self.store.list_levels().await?)
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_level(&self, req: LevelRequest) -> Result<LoyaltyLevel> {
        validate_level(&req)?;
        let level = LoyaltyLevel::create(req.name.trim(), req.bonus_percent);
        self.store.insert_level(&level).await?;
        Ok(level)
    }

    pub async fn update_level(&self, id: Uuid, req: LevelRequest) -> Result<LoyaltyLevel> {
        validate_level(&req)?;
        let mut level = self.store.find_level(id).await?.ok_or_else(|| EcommerceError::not_found("level"))?;
        level.name = req.name.trim().to_string();
        level.bonus_percent = req.bonus_percent;
        if !self.store.update_level(&level).await? {
            return Err(EcommerceError::not_found("level"));
        }
        Ok(level)
    }

    pub async fn delete_level(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_level(id).await? {
            return Err(EcommerceError::not_found("level"));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn assign_level(&self, user_id: Uuid, level_id: Uuid) -> Result<LoyaltyAccount> {
        self.store.find_level(level_id).await?.ok_or_else(|| EcommerceError::not_found("level"))?;
        let mut account = self.get_account(user_id).await?;
        account.level_id = Some(level_id);
        account.touch();
        self.store.save_account(&account).await?;
        Ok(account)
    }

    async fn account_or_open(&self, user_id: Uuid) -> Result<LoyaltyAccount> {
        if let Some(account) = self.store.find_account(user_id).await? {
            return Ok(account);
        }
        let entry_level = self.store.list_levels().await?.into_iter().next().map(|l| l.id);
        let account = LoyaltyAccount::open(user_id, entry_level);
        self.store.save_account(&account).await?;
        Ok(account)
    }
}

fn validate_level(req: &LevelRequest) -> Result<()> {
    req.validate()?;
    if req.bonus_percent < Decimal::ZERO || req.bonus_percent > Decimal::from(100) {
        return Err(EcommerceError::Validation("bonus_percent must be between 0 and 100".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use rust_decimal_macros::dec;

    fn service() -> (Arc<MemoryStore>, LoyaltyService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), LoyaltyService::new(store))
    }

    #[tokio::test]
    async fn test_history_skips_non_positive_amounts() {
        let (store, svc) = service();
        let user = Uuid::new_v4();
        assert!(svc.add_order_to_history(user, "o-1", vec![], 0, Utc::now(), None).await.unwrap().is_none());
        assert!(svc.add_order_to_history(user, "o-2", vec![], -5, Utc::now(), None).await.unwrap().is_none());
        assert!(store.all_history().await.is_empty());
        svc.add_order_to_history(user, "o-3", vec![], 10, Utc::now(), None).await.unwrap();
        assert_eq!(svc.get_history(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_does_not_accrue_bonus() {
        let (_, svc) = service();
        let user = Uuid::new_v4();
        svc.create_level(LevelRequest { name: "Base".into(), bonus_percent: dec!(5) }).await.unwrap();
        svc.add_purchase(user, PurchaseRequest { amount: 100, order_id: None, description: None }).await.unwrap();
        svc.add_order_to_history(user, "o-1", vec![], 1000, Utc::now(), None).await.unwrap();
        let balance = svc.get_bonus_balance(user).await.unwrap();
        assert_eq!((balance.bonus_balance, balance.total_amount), (5, 100));
    }

    #[tokio::test]
    async fn test_purchase_opens_account_at_lowest_level() {
        let (_, svc) = service();
        let user = Uuid::new_v4();
        svc.create_level(LevelRequest { name: "Gold".into(), bonus_percent: dec!(10) }).await.unwrap();
        let silver = svc.create_level(LevelRequest { name: "Silver".into(), bonus_percent: dec!(3) }).await.unwrap();
        let account = svc.add_purchase(user, PurchaseRequest { amount: 1000, order_id: Some("o-9".into()), description: None }).await.unwrap();
        assert_eq!(account.level_id, Some(silver.id));
        assert_eq!(account.bonus_balance, 30);
        assert_eq!(svc.get_history(user).await.unwrap()[0].order_id, "o-9");
    }

    #[tokio::test]
    async fn test_purchase_amount_is_capped() {
        let (_, svc) = service();
        let user = Uuid::new_v4();
        let err = svc.add_purchase(user, PurchaseRequest { amount: i64::MAX, order_id: None, description: None }).await.unwrap_err();
        assert!(matches!(err, EcommerceError::Validation(_)));
        assert!(svc.get_history(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_level_admin() {
        let (_, svc) = service();
        let user = Uuid::new_v4();
        assert!(matches!(svc.assign_level(user, Uuid::new_v4()).await, Err(EcommerceError::NotFound(_))));
        let vip = svc.create_level(LevelRequest { name: "VIP".into(), bonus_percent: dec!(15) }).await.unwrap();
        assert!(matches!(svc.assign_level(user, vip.id).await, Err(EcommerceError::NotFound(_))));
        assert!(matches!(
            svc.create_level(LevelRequest { name: "VIP".into(), bonus_percent: dec!(1) }).await,
            Err(EcommerceError::Conflict(_))
        ));
        assert!(matches!(
            svc.create_level(LevelRequest { name: "Odd".into(), bonus_percent: dec!(150) }).await,
            Err(EcommerceError::Validation(_))
        ));

        svc.add_purchase(user, PurchaseRequest { amount: 200, order_id: None, description: None }).await.unwrap();
        let account = svc.assign_level(user, vip.id).await.unwrap();
        assert_eq!(account.level_id, Some(vip.id));
        let renamed = svc.update_level(vip.id, LevelRequest { name: "Platinum".into(), bonus_percent: dec!(20) }).await.unwrap();
        assert_eq!(renamed.name, "Platinum");
        let card = svc.add_card(user, CardRequest { card_number: "4000-1234".into() }).await.unwrap();
        assert_eq!(card.card_number.as_deref(), Some("4000-1234"));
        svc.delete_level(vip.id).await.unwrap();
        assert_eq!(svc.get_account(user).await.unwrap().level_id, None);
    }
}
