//! Products and categories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Category, Product};
use crate::repository::{ProductFilter, Store};
use crate::{EcommerceError, Result};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub price: i64,
    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub discount: i64,
    pub discount_start: Option<DateTime<Utc>>,
    pub discount_end: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub inserts: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32>, pub category: Option<Uuid>, pub search: Option<String> }

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: i64, pub page: u32 }

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self { Self { store } }

    pub async fn list_products(&self, p: ListParams) -> Result<PaginatedResponse<Product>> {
        let page = p.page.unwrap_or(1).max(1);
        let per_page = p.per_page.unwrap_or(20).clamp(1, 100);
        let filter = ProductFilter {
            category_id: p.category,
            search: p.search.filter(|s| !s.trim().is_empty()),
            limit: i64::from(per_page),
            offset: i64::from(page - 1) * i64::from(per_page),
        };
        let (data, total) = self.store.list_products(&filter).await?;
        Ok(PaginatedResponse { data, total, page })
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product> {
        self.store.find_product(id).await?.ok_or_else(|| EcommerceError::not_found("product"))
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_product(&self, req: ProductRequest) -> Result<Product> {
        self.check_product(&req).await?;
        let mut product = Product::create(req.name.clone(), req.price);
        apply_product_request(&mut product, req);
        self.store.insert_product(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self, req))]
    pub async fn update_product(&self, id: Uuid, req: ProductRequest) -> Result<Product> {
        self.check_product(&req).await?;
        let mut product = self.get_product(id).await?;
        apply_product_request(&mut product, req);
        product.touch();
        if !self.store.update_product(&product).await? {
            return Err(EcommerceError::not_found("product"));
        }
        Ok(product)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(EcommerceError::not_found("product"));
        }
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category> {
        self.store.find_category(id).await?.ok_or_else(|| EcommerceError::not_found("category"))
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_category(&self, req: CategoryRequest) -> Result<Category> {
        req.validate()?;
        let category = Category::create(req.name.trim(), req.description);
        self.store.insert_category(&category).await?;
        Ok(category)
    }

    pub async fn update_category(&self, id: Uuid, req: CategoryRequest) -> Result<Category> {
        req.validate()?;
        let mut category = self.get_category(id).await?;
        category.name = req.name.trim().to_string();
        category.description = req.description;
        if !self.store.update_category(&category).await? {
            return Err(EcommerceError::not_found("category"));
        }
        Ok(category)
    }

    /// Detaches the category's products, then removes the category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<()> {
        self.get_category(id).await?;
        let detached = self.store.detach_category(id).await?;
        self.store.delete_category(id).await?;
        info!(category_id = %id, detached, "category deleted");
        Ok(())
    }

    async fn check_product(&self, req: &ProductRequest) -> Result<()> {
        req.validate()?;
        if let (Some(start), Some(end)) = (req.discount_start, req.discount_end) {
            if end < start {
                return Err(EcommerceError::Validation("discount_end must not precede discount_start".into()));
            }
        }
        if let Some(category_id) = req.category_id {
            self.get_category(category_id).await?;
        }
        Ok(())
    }
}

fn apply_product_request(product: &mut Product, req: ProductRequest) {
    product.name = req.name;
    product.description = req.description;
    product.price = req.price;
    product.discount = req.discount;
    product.discount_start = req.discount_start;
    product.discount_end = req.discount_end;
    product.category_id = req.category_id;
    product.sizes = req.sizes;
    product.materials = req.materials;
    product.inserts = req.inserts;
    product.images = req.images;
}
