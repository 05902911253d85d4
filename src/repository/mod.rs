//! Storage seams.
//!
//! Each collection gets its own trait; [`Store`] bundles them so services can
//! hold a single `Arc<dyn Store>`. [`postgres::PgStore`] backs the running
//! service, [`memory::MemoryStore`] backs tests and local experiments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    Cart, Category, Coupon, LoyaltyAccount, LoyaltyLevel, Payment, Product, PurchaseHistory,
};
use crate::domain::value_objects::Owner;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique field is already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(db.message().to_string());
            }
        }
        Self::Database(err.to_string())
    }
}

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &Product) -> RepoResult<()>;
    async fn update_product(&self, product: &Product) -> RepoResult<bool>;
    async fn find_product(&self, id: Uuid) -> RepoResult<Option<Product>>;
    /// Returns one page plus the total number of matches.
    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<(Vec<Product>, i64)>;
    async fn delete_product(&self, id: Uuid) -> RepoResult<bool>;
    /// Clears `category_id` on every product in the category.
    async fn detach_category(&self, category_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert_category(&self, category: &Category) -> RepoResult<()>;
    async fn update_category(&self, category: &Category) -> RepoResult<bool>;
    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_open_cart(&self, owner: &Owner) -> RepoResult<Option<Cart>>;
    /// Inserts `cart` unless the owner already has an open cart, and returns
    /// whichever open cart exists afterwards.
    async fn create_open_cart(&self, cart: &Cart) -> RepoResult<Cart>;
    async fn find_cart(&self, id: Uuid) -> RepoResult<Option<Cart>>;
    async fn save_cart(&self, cart: &Cart) -> RepoResult<()>;
    /// Open, non-empty carts with an email, untouched since `before`, not yet reminded.
    async fn find_stale_carts(&self, before: DateTime<Utc>) -> RepoResult<Vec<Cart>>;
    async fn mark_reminder_sent(&self, id: Uuid) -> RepoResult<()>;
    async fn delete_user_carts(&self, user_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn insert_coupon(&self, coupon: &Coupon) -> RepoResult<()>;
    async fn find_coupon(&self, code: &str) -> RepoResult<Option<Coupon>>;
    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>>;
    async fn delete_coupon(&self, code: &str) -> RepoResult<bool>;
}

#[async_trait]
pub trait LoyaltyRepository: Send + Sync {
    async fn find_account(&self, user_id: Uuid) -> RepoResult<Option<LoyaltyAccount>>;
    /// Insert or replace, keyed by `user_id`.
    async fn save_account(&self, account: &LoyaltyAccount) -> RepoResult<()>;
    async fn delete_account(&self, user_id: Uuid) -> RepoResult<bool>;
    async fn insert_level(&self, level: &LoyaltyLevel) -> RepoResult<()>;
    async fn update_level(&self, level: &LoyaltyLevel) -> RepoResult<bool>;
    async fn find_level(&self, id: Uuid) -> RepoResult<Option<LoyaltyLevel>>;
    /// Ordered by `bonus_percent`, lowest first.
    async fn list_levels(&self) -> RepoResult<Vec<LoyaltyLevel>>;
    async fn delete_level(&self, id: Uuid) -> RepoResult<bool>;
    async fn append_history(&self, entry: &PurchaseHistory) -> RepoResult<()>;
    /// Newest first.
    async fn list_history(&self, user_id: Uuid) -> RepoResult<Vec<PurchaseHistory>>;
    async fn delete_history(&self, user_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert_payment(&self, payment: &Payment) -> RepoResult<()>;
    async fn find_payment_by_order(&self, order_id: &str) -> RepoResult<Option<Payment>>;
    async fn save_payment(&self, payment: &Payment) -> RepoResult<()>;
}

pub trait Store:
    ProductRepository + CategoryRepository + CartRepository + CouponRepository + LoyaltyRepository + PaymentRepository
{
}

impl<T> Store for T where
    T: ProductRepository + CategoryRepository + CartRepository + CouponRepository + LoyaltyRepository + PaymentRepository
{
}
