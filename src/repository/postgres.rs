//! `PostgreSQL` store.
//!
//! Document-shaped fields (cart lines, history snapshots, product options)
//! live in `JSONB` columns. Schema lives in `migrations/`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    CartRepository, CategoryRepository, CouponRepository, LoyaltyRepository, PaymentRepository,
    ProductFilter, ProductRepository, RepoResult, RepositoryError,
};
use crate::domain::aggregates::{
    Cart, CartItem, Category, Coupon, CouponDiscount, LoyaltyAccount, LoyaltyLevel, Payment,
    PaymentStatus, Product, PurchaseHistory,
};
use crate::domain::value_objects::{OrderId, Owner};

/// Create a connection pool with sensible defaults.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
    pub fn pool(&self) -> &PgPool { &self.pool }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProductOptions {
    sizes: Vec<String>,
    materials: Vec<String>,
    inserts: Vec<String>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, description: Option<String>, price: i64, discount: i64,
    discount_start: Option<DateTime<Utc>>, discount_end: Option<DateTime<Utc>>, category_id: Option<Uuid>,
    options: Json<ProductOptions>, images: Vec<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        let ProductOptions { sizes, materials, inserts } = r.options.0;
        Self {
            id: r.id, name: r.name, description: r.description, price: r.price, discount: r.discount,
            discount_start: r.discount_start, discount_end: r.discount_end, category_id: r.category_id,
            sizes, materials, inserts, images: r.images, created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, description: Option<String>, created_at: DateTime<Utc> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self { Self { id: r.id, name: r.name, description: r.description, created_at: r.created_at } }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: Uuid, owner_kind: String, owner_id: String, items: Json<Vec<CartItem>>, is_ordered: bool,
    order_id: Option<String>, applied_coupon_code: Option<String>, applied_bonus_amount: Option<i64>,
    pre_total: i64, final_total: i64, email: Option<String>, reminder_sent: bool,
    created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;
    fn try_from(r: CartRow) -> Result<Self, Self::Error> {
        let owner = Owner::from_parts(&r.owner_kind, &r.owner_id)
            .ok_or_else(|| RepositoryError::Database(format!("cart {} has invalid owner {}:{}", r.id, r.owner_kind, r.owner_id)))?;
        Ok(Self {
            id: r.id, owner, items: r.items.0, is_ordered: r.is_ordered, order_id: r.order_id.map(OrderId::from),
            applied_coupon_code: r.applied_coupon_code, applied_bonus_amount: r.applied_bonus_amount,
            pre_total: r.pre_total, final_total: r.final_total, email: r.email, reminder_sent: r.reminder_sent,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid, code: String, amount: Option<i64>, percent: Option<Decimal>,
    start_date: DateTime<Utc>, expiry_date: DateTime<Utc>, created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;
    fn try_from(r: CouponRow) -> Result<Self, Self::Error> {
        let discount = match (r.amount, r.percent) {
            (Some(amount), None) => CouponDiscount::Amount(amount),
            (None, Some(percent)) => CouponDiscount::Percent(percent),
            _ => return Err(RepositoryError::Database(format!("coupon {} must have exactly one of amount/percent", r.code))),
        };
        Ok(Self { id: r.id, code: r.code, discount, start_date: r.start_date, expiry_date: r.expiry_date, created_at: r.created_at })
    }
}

#[derive(sqlx::FromRow)]
struct LevelRow { id: Uuid, name: String, bonus_percent: Decimal }

impl From<LevelRow> for LoyaltyLevel {
    fn from(r: LevelRow) -> Self { Self { id: r.id, name: r.name, bonus_percent: r.bonus_percent } }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid, user_id: Uuid, level_id: Option<Uuid>, total_amount: i64, bonus_balance: i64,
    card_number: Option<String>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl From<AccountRow> for LoyaltyAccount {
    fn from(r: AccountRow) -> Self {
        Self {
            id: r.id, user_id: r.user_id, level_id: r.level_id, total_amount: r.total_amount,
            bonus_balance: r.bonus_balance, card_number: r.card_number, created_at: r.created_at, updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid, user_id: Uuid, order_id: String, amount: i64, items: Json<Vec<CartItem>>,
    date: DateTime<Utc>, description: Option<String>,
}

impl From<HistoryRow> for PurchaseHistory {
    fn from(r: HistoryRow) -> Self {
        Self { id: r.id, user_id: r.user_id, order_id: r.order_id, amount: r.amount, items: r.items.0, date: r.date, description: r.description }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid, user_id: Option<Uuid>, cart_id: Uuid, amount: i64, currency: String, status: String,
    payment_method: String, transaction_id: Option<String>, order_id: String,
    contact_info: Option<Json<serde_json::Value>>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;
    fn try_from(r: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&r.status)
            .ok_or_else(|| RepositoryError::Database(format!("payment {} has unknown status {}", r.id, r.status)))?;
        Ok(Self {
            id: r.id, user_id: r.user_id, cart_id: r.cart_id, amount: r.amount, currency: r.currency, status,
            payment_method: r.payment_method, transaction_id: r.transaction_id, order_id: OrderId::from(r.order_id),
            contact_info: r.contact_info.map(|j| j.0), created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

fn coupon_columns(discount: &CouponDiscount) -> (Option<i64>, Option<Decimal>) {
    match discount {
        CouponDiscount::Amount(a) => (Some(*a), None),
        CouponDiscount::Percent(p) => (None, Some(*p)),
    }
}

// =============================================================================
// Repositories
// =============================================================================

#[async_trait]
impl ProductRepository for PgStore {
    async fn insert_product(&self, p: &Product) -> RepoResult<()> {
        let options = ProductOptions { sizes: p.sizes.clone(), materials: p.materials.clone(), inserts: p.inserts.clone() };
        sqlx::query("INSERT INTO products (id, name, description, price, discount, discount_start, discount_end, category_id, options, images, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(p.discount).bind(p.discount_start).bind(p.discount_end)
            .bind(p.category_id).bind(Json(options)).bind(&p.images).bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> RepoResult<bool> {
        let options = ProductOptions { sizes: p.sizes.clone(), materials: p.materials.clone(), inserts: p.inserts.clone() };
        let res = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, discount = $5, discount_start = $6, discount_end = $7, category_id = $8, options = $9, images = $10, updated_at = $11 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(p.discount).bind(p.discount_start).bind(p.discount_end)
            .bind(p.category_id).bind(Json(options)).bind(&p.images).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Product::from))
    }

    async fn list_products(&self, f: &ProductFilter) -> RepoResult<(Vec<Product>, i64)> {
        let search = f.search.as_ref().map(|s| format!("%{s}%"));
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE ($1::uuid IS NULL OR category_id = $1) AND ($2::text IS NULL OR name ILIKE $2) ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4")
            .bind(f.category_id).bind(&search).bind(f.limit).bind(f.offset)
            .fetch_all(&self.pool).await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE ($1::uuid IS NULL OR category_id = $1) AND ($2::text IS NULL OR name ILIKE $2)")
            .bind(f.category_id).bind(&search)
            .fetch_one(&self.pool).await?;
        Ok((rows.into_iter().map(Product::from).collect(), total.0))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn detach_category(&self, category_id: Uuid) -> RepoResult<u64> {
        let res = sqlx::query("UPDATE products SET category_id = NULL, updated_at = NOW() WHERE category_id = $1")
            .bind(category_id).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn insert_category(&self, c: &Category) -> RepoResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(c.created_at)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("category '{}' already exists", c.name)))?;
        Ok(())
    }

    async fn update_category(&self, c: &Category) -> RepoResult<bool> {
        let res = sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
            .bind(c.id).bind(&c.name).bind(&c.description)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("category '{}' already exists", c.name)))?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_open_cart(&self, owner: &Owner) -> RepoResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE owner_kind = $1 AND owner_id = $2 AND NOT is_ordered")
            .bind(owner.kind()).bind(owner.key())
            .fetch_optional(&self.pool).await?;
        row.map(Cart::try_from).transpose()
    }

    async fn create_open_cart(&self, cart: &Cart) -> RepoResult<Cart> {
        sqlx::query("INSERT INTO carts (id, owner_kind, owner_id, items, is_ordered, pre_total, final_total, created_at, updated_at) VALUES ($1, $2, $3, $4, FALSE, 0, 0, $5, $6) ON CONFLICT (owner_kind, owner_id) WHERE NOT is_ordered DO NOTHING")
            .bind(cart.id).bind(cart.owner.kind()).bind(cart.owner.key()).bind(Json(&cart.items)).bind(cart.created_at).bind(cart.updated_at)
            .execute(&self.pool).await?;
        self.find_open_cart(&cart.owner).await?
            .ok_or_else(|| RepositoryError::Database(format!("open cart for {} vanished after insert", cart.owner)))
    }

    async fn find_cart(&self, id: Uuid) -> RepoResult<Option<Cart>> {
        let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        row.map(Cart::try_from).transpose()
    }

    async fn save_cart(&self, c: &Cart) -> RepoResult<()> {
        let res = sqlx::query("INSERT INTO carts (id, owner_kind, owner_id, items, is_ordered, order_id, applied_coupon_code, applied_bonus_amount, pre_total, final_total, email, reminder_sent, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) ON CONFLICT (id) DO UPDATE SET items = EXCLUDED.items, is_ordered = EXCLUDED.is_ordered, order_id = EXCLUDED.order_id, applied_coupon_code = EXCLUDED.applied_coupon_code, applied_bonus_amount = EXCLUDED.applied_bonus_amount, pre_total = EXCLUDED.pre_total, final_total = EXCLUDED.final_total, email = EXCLUDED.email, reminder_sent = EXCLUDED.reminder_sent, updated_at = EXCLUDED.updated_at WHERE NOT carts.is_ordered")
            .bind(c.id).bind(c.owner.kind()).bind(c.owner.key()).bind(Json(&c.items)).bind(c.is_ordered)
            .bind(c.order_id.as_ref().map(OrderId::as_str)).bind(&c.applied_coupon_code).bind(c.applied_bonus_amount)
            .bind(c.pre_total).bind(c.final_total).bind(&c.email).bind(c.reminder_sent).bind(c.created_at).bind(c.updated_at)
            .execute(&self.pool).await?;
        if res.rows_affected() == 0 {
            return Err(RepositoryError::Conflict("cart is already ordered".into()));
        }
        Ok(())
    }

    async fn find_stale_carts(&self, before: DateTime<Utc>) -> RepoResult<Vec<Cart>> {
        let rows = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE NOT is_ordered AND NOT reminder_sent AND email IS NOT NULL AND jsonb_array_length(items) > 0 AND updated_at < $1 ORDER BY updated_at LIMIT 500")
            .bind(before).fetch_all(&self.pool).await?;
        rows.into_iter().map(Cart::try_from).collect()
    }

    async fn mark_reminder_sent(&self, id: Uuid) -> RepoResult<()> {
        sqlx::query("UPDATE carts SET reminder_sent = TRUE WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_user_carts(&self, user_id: Uuid) -> RepoResult<u64> {
        let res = sqlx::query("DELETE FROM carts WHERE owner_kind = 'user' AND owner_id = $1")
            .bind(user_id.to_string()).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl CouponRepository for PgStore {
    async fn insert_coupon(&self, c: &Coupon) -> RepoResult<()> {
        let (amount, percent) = coupon_columns(&c.discount);
        sqlx::query("INSERT INTO coupons (id, code, amount, percent, start_date, expiry_date, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(c.id).bind(&c.code).bind(amount).bind(percent).bind(c.start_date).bind(c.expiry_date).bind(c.created_at)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("coupon '{}' already exists", c.code)))?;
        Ok(())
    }

    async fn find_coupon(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let row = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1").bind(code).fetch_optional(&self.pool).await?;
        row.map(Coupon::try_from).transpose()
    }

    async fn list_coupons(&self) -> RepoResult<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        rows.into_iter().map(Coupon::try_from).collect()
    }

    async fn delete_coupon(&self, code: &str) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM coupons WHERE code = $1").bind(code).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl LoyaltyRepository for PgStore {
    async fn find_account(&self, user_id: Uuid) -> RepoResult<Option<LoyaltyAccount>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM loyalty_accounts WHERE user_id = $1").bind(user_id).fetch_optional(&self.pool).await?;
        Ok(row.map(LoyaltyAccount::from))
    }

    async fn save_account(&self, a: &LoyaltyAccount) -> RepoResult<()> {
        sqlx::query("INSERT INTO loyalty_accounts (id, user_id, level_id, total_amount, bonus_balance, card_number, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (user_id) DO UPDATE SET level_id = EXCLUDED.level_id, total_amount = EXCLUDED.total_amount, bonus_balance = EXCLUDED.bonus_balance, card_number = EXCLUDED.card_number, updated_at = EXCLUDED.updated_at")
            .bind(a.id).bind(a.user_id).bind(a.level_id).bind(a.total_amount).bind(a.bonus_balance).bind(&a.card_number).bind(a.created_at).bind(a.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_account(&self, user_id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM loyalty_accounts WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_level(&self, l: &LoyaltyLevel) -> RepoResult<()> {
        sqlx::query("INSERT INTO loyalty_levels (id, name, bonus_percent) VALUES ($1, $2, $3)")
            .bind(l.id).bind(&l.name).bind(l.bonus_percent)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("level '{}' already exists", l.name)))?;
        Ok(())
    }

    async fn update_level(&self, l: &LoyaltyLevel) -> RepoResult<bool> {
        let res = sqlx::query("UPDATE loyalty_levels SET name = $2, bonus_percent = $3 WHERE id = $1")
            .bind(l.id).bind(&l.name).bind(l.bonus_percent)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("level '{}' already exists", l.name)))?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_level(&self, id: Uuid) -> RepoResult<Option<LoyaltyLevel>> {
        let row = sqlx::query_as::<_, LevelRow>("SELECT * FROM loyalty_levels WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(LoyaltyLevel::from))
    }

    async fn list_levels(&self) -> RepoResult<Vec<LoyaltyLevel>> {
        let rows = sqlx::query_as::<_, LevelRow>("SELECT * FROM loyalty_levels ORDER BY bonus_percent, name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(LoyaltyLevel::from).collect())
    }

    async fn delete_level(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM loyalty_levels WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn append_history(&self, h: &PurchaseHistory) -> RepoResult<()> {
        sqlx::query("INSERT INTO purchase_history (id, user_id, order_id, amount, items, date, description) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(h.id).bind(h.user_id).bind(&h.order_id).bind(h.amount).bind(Json(&h.items)).bind(h.date).bind(&h.description)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_history(&self, user_id: Uuid) -> RepoResult<Vec<PurchaseHistory>> {
        let rows = sqlx::query_as::<_, HistoryRow>("SELECT * FROM purchase_history WHERE user_id = $1 ORDER BY date DESC").bind(user_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PurchaseHistory::from).collect())
    }

    async fn delete_history(&self, user_id: Uuid) -> RepoResult<u64> {
        let res = sqlx::query("DELETE FROM purchase_history WHERE user_id = $1").bind(user_id).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn insert_payment(&self, p: &Payment) -> RepoResult<()> {
        sqlx::query("INSERT INTO payments (id, user_id, cart_id, amount, currency, status, payment_method, transaction_id, order_id, contact_info, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(p.user_id).bind(p.cart_id).bind(p.amount).bind(&p.currency).bind(p.status.as_str())
            .bind(&p.payment_method).bind(&p.transaction_id).bind(p.order_id.as_str()).bind(p.contact_info.as_ref().map(Json))
            .bind(p.created_at).bind(p.updated_at)
            .execute(&self.pool).await
            .map_err(|e| conflict_as(e, format!("payment for order '{}' already exists", p.order_id)))?;
        Ok(())
    }

    async fn find_payment_by_order(&self, order_id: &str) -> RepoResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(&self.pool).await?;
        row.map(Payment::try_from).transpose()
    }

    async fn save_payment(&self, p: &Payment) -> RepoResult<()> {
        sqlx::query("UPDATE payments SET status = $2, transaction_id = $3, contact_info = $4, updated_at = $5 WHERE id = $1")
            .bind(p.id).bind(p.status.as_str()).bind(&p.transaction_id).bind(p.contact_info.as_ref().map(Json)).bind(p.updated_at)
            .execute(&self.pool).await?;
        Ok(())
    }
}

fn conflict_as(err: sqlx::Error, message: String) -> RepositoryError {
    match RepositoryError::from(err) {
        RepositoryError::Conflict(_) => RepositoryError::Conflict(message),
        other => other,
    }
}
