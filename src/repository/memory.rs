//! In-process store with the same uniqueness rules as the Postgres schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CartRepository, CategoryRepository, CouponRepository, LoyaltyRepository, PaymentRepository,
    ProductFilter, ProductRepository, RepoResult, RepositoryError,
};
use crate::domain::aggregates::{
    Cart, Category, Coupon, LoyaltyAccount, LoyaltyLevel, Payment, Product, PurchaseHistory,
};
use crate::domain::value_objects::Owner;

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    carts: HashMap<Uuid, Cart>,
    coupons: HashMap<String, Coupon>,
    accounts: HashMap<Uuid, LoyaltyAccount>,
    levels: HashMap<Uuid, LoyaltyLevel>,
    history: Vec<PurchaseHistory>,
    payments: HashMap<String, Payment>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Every history row, oldest first. Test helper.
    pub async fn all_history(&self) -> Vec<PurchaseHistory> {
        self.inner.read().await.history.clone()
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert_product(&self, product: &Product) -> RepoResult<()> {
        self.inner.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> RepoResult<bool> {
        let mut t = self.inner.write().await;
        match t.products.get_mut(&product.id) {
            Some(existing) => { *existing = product.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn find_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<(Vec<Product>, i64)> {
        let t = self.inner.read().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut matches: Vec<Product> = t.products.values()
            .filter(|p| filter.category_id.map_or(true, |c| p.category_id == Some(c)))
            .filter(|p| needle.as_deref().map_or(true, |n| p.name.to_lowercase().contains(n)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matches.len() as i64;
        let page = matches.into_iter().skip(filter.offset.max(0) as usize).take(filter.limit.max(0) as usize).collect();
        Ok((page, total))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.inner.write().await.products.remove(&id).is_some())
    }

    async fn detach_category(&self, category_id: Uuid) -> RepoResult<u64> {
        let mut t = self.inner.write().await;
        let mut n = 0;
        for p in t.products.values_mut().filter(|p| p.category_id == Some(category_id)) {
            p.category_id = None;
            n += 1;
        }
        Ok(n)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn insert_category(&self, category: &Category) -> RepoResult<()> {
        let mut t = self.inner.write().await;
        if t.categories.values().any(|c| c.name == category.name) {
            return Err(RepositoryError::Conflict(format!("category '{}' already exists", category.name)));
        }
        t.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> RepoResult<bool> {
        let mut t = self.inner.write().await;
        if t.categories.values().any(|c| c.name == category.name && c.id != category.id) {
            return Err(RepositoryError::Conflict(format!("category '{}' already exists", category.name)));
        }
        match t.categories.get_mut(&category.id) {
            Some(existing) => { *existing = category.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut all: Vec<Category> = self.inner.read().await.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.inner.write().await.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_open_cart(&self, owner: &Owner) -> RepoResult<Option<Cart>> {
        Ok(self.inner.read().await.carts.values().find(|c| !c.is_ordered && &c.owner == owner).cloned())
    }

    async fn create_open_cart(&self, cart: &Cart) -> RepoResult<Cart> {
        let mut t = self.inner.write().await;
        if let Some(existing) = t.carts.values().find(|c| !c.is_ordered && c.owner == cart.owner) {
            return Ok(existing.clone());
        }
        t.carts.insert(cart.id, cart.clone());
        Ok(cart.clone())
    }

    async fn find_cart(&self, id: Uuid) -> RepoResult<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(&id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> RepoResult<()> {
        let mut t = self.inner.write().await;
        if t.carts.get(&cart.id).is_some_and(|stored| stored.is_ordered) {
            return Err(RepositoryError::Conflict("cart is already ordered".into()));
        }
        t.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn find_stale_carts(&self, before: DateTime<Utc>) -> RepoResult<Vec<Cart>> {
        Ok(self.inner.read().await.carts.values()
            .filter(|c| !c.is_ordered && !c.items.is_empty() && c.email.is_some() && !c.reminder_sent && c.updated_at < before)
            .cloned()
            .collect())
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> RepoResult<()> {
        if let Some(cart) = self.inner.write().await.carts.get_mut(&id) {
            cart.reminder_sent = true;
        }
        Ok(())
    }

    async fn delete_user_carts(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut t = self.inner.write().await;
        let removed: Vec<Uuid> = t.carts.values().filter(|c| c.owner.user_id() == Some(user_id)).map(|c| c.id).collect();
        t.carts.retain(|id, _| !removed.contains(id));
        t.payments.retain(|_, p| !removed.contains(&p.cart_id));
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl CouponRepository for MemoryStore {
    async fn insert_coupon(&self, coupon: &Coupon) -> RepoResult<()> {
        let mut t = self.inner.write().await;
        if t.coupons.contains_key(&coupon.code) {
            return Err(RepositoryError::Conflict(format!("coupon '{}' already exists", coupon.code)));
        }
        t.coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn find_coupon(&self, code: &str) -> RepoResult<Option<Coupon>> {
        Ok(self.inner.read().await.coupons.get(code).cloned())
    }

    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>> {
        let mut all: Vec<Coupon> = self.inner.read().await.coupons.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn delete_coupon(&self, code: &str) -> RepoResult<bool> {
        Ok(self.inner.write().await.coupons.remove(code).is_some())
    }
}

#[async_trait]
impl LoyaltyRepository for MemoryStore {
    async fn find_account(&self, user_id: Uuid) -> RepoResult<Option<LoyaltyAccount>> {
        Ok(self.inner.read().await.accounts.get(&user_id).cloned())
    }

    async fn save_account(&self, account: &LoyaltyAccount) -> RepoResult<()> {
        self.inner.write().await.accounts.insert(account.user_id, account.clone());
        Ok(())
    }

    async fn delete_account(&self, user_id: Uuid) -> RepoResult<bool> {
        Ok(self.inner.write().await.accounts.remove(&user_id).is_some())
    }

    async fn insert_level(&self, level: &LoyaltyLevel) -> RepoResult<()> {
        let mut t = self.inner.write().await;
        if t.levels.values().any(|l| l.name == level.name) {
            return Err(RepositoryError::Conflict(format!("level '{}' already exists", level.name)));
        }
        t.levels.insert(level.id, level.clone());
        Ok(())
    }

    async fn update_level(&self, level: &LoyaltyLevel) -> RepoResult<bool> {
        let mut t = self.inner.write().await;
        if t.levels.values().any(|l| l.name == level.name && l.id != level.id) {
            return Err(RepositoryError::Conflict(format!("level '{}' already exists", level.name)));
        }
        match t.levels.get_mut(&level.id) {
            Some(existing) => { *existing = level.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn find_level(&self, id: Uuid) -> RepoResult<Option<LoyaltyLevel>> {
        Ok(self.inner.read().await.levels.get(&id).cloned())
    }

    async fn list_levels(&self) -> RepoResult<Vec<LoyaltyLevel>> {
        let mut all: Vec<LoyaltyLevel> = self.inner.read().await.levels.values().cloned().collect();
        all.sort_by(|a, b| a.bonus_percent.cmp(&b.bonus_percent).then_with(|| a.name.cmp(&b.name)));
        Ok(all)
    }

    async fn delete_level(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.inner.write().await;
        let removed = t.levels.remove(&id).is_some();
        if removed {
            for account in t.accounts.values_mut().filter(|a| a.level_id == Some(id)) {
                account.level_id = None;
            }
        }
        Ok(removed)
    }

    async fn append_history(&self, entry: &PurchaseHistory) -> RepoResult<()> {
        self.inner.write().await.history.push(entry.clone());
        Ok(())
    }

    async fn list_history(&self, user_id: Uuid) -> RepoResult<Vec<PurchaseHistory>> {
        let t = self.inner.read().await;
        let mut rows: Vec<PurchaseHistory> = t.history.iter().filter(|h| h.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn delete_history(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut t = self.inner.write().await;
        let before = t.history.len();
        t.history.retain(|h| h.user_id != user_id);
        Ok((before - t.history.len()) as u64)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn insert_payment(&self, payment: &Payment) -> RepoResult<()> {
        let mut t = self.inner.write().await;
        let key = payment.order_id.as_str().to_string();
        if t.payments.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!("payment for order '{key}' already exists")));
        }
        t.payments.insert(key, payment.clone());
        Ok(())
    }

    async fn find_payment_by_order(&self, order_id: &str) -> RepoResult<Option<Payment>> {
        Ok(self.inner.read().await.payments.get(order_id).cloned())
    }

    async fn save_payment(&self, payment: &Payment) -> RepoResult<()> {
        self.inner.write().await.payments.insert(payment.order_id.as_str().to_string(), payment.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_open_cart_per_owner() {
        let store = MemoryStore::new();
        let owner = Owner::Guest("g1".into());
        let first = store.create_open_cart(&Cart::new(owner.clone())).await.unwrap();
        let second = store.create_open_cart(&Cart::new(owner.clone())).await.unwrap();
        assert_eq!(first.id, second.id);

        let mut ordered = first.clone();
        ordered.mark_ordered();
        store.save_cart(&ordered).await.unwrap();
        let fresh = store.create_open_cart(&Cart::new(owner)).await.unwrap();
        assert_ne!(fresh.id, first.id);
    }

    #[tokio::test]
    async fn test_stale_save_cannot_reopen_ordered_cart() {
        let store = MemoryStore::new();
        let stale = store.create_open_cart(&Cart::new(Owner::Guest("g1".into()))).await.unwrap();
        let mut ordered = stale.clone();
        ordered.mark_ordered();
        store.save_cart(&ordered).await.unwrap();

        let err = store.save_cart(&stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(store.find_cart(stale.id).await.unwrap().unwrap().is_ordered);
    }

    #[tokio::test]
    async fn test_category_name_unique() {
        let store = MemoryStore::new();
        store.insert_category(&Category::create("Rings", None)).await.unwrap();
        let err = store.insert_category(&Category::create("Rings", None)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
