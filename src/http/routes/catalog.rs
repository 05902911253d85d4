use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::domain::aggregates::{Category, Product};
use crate::http::{AdminCtx, AppState};
use crate::services::catalog::{CategoryRequest, ListParams, PaginatedResponse, ProductRequest};
use crate::Result;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", get(get_category).put(update_category).delete(delete_category))
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<Product>>> {
    s.catalog.list_products(p).await.map(Json)
}

async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    s.catalog.get_product(id).await.map(Json)
}

async fn create_product(State(s): State<AppState>, _: AdminCtx, Json(r): Json<ProductRequest>) -> Result<(StatusCode, Json<Product>)> {
    let p = s.catalog.create_product(r).await?;
    Ok((StatusCode::CREATED, Json(p)))
}

async fn update_product(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>, Json(r): Json<ProductRequest>) -> Result<Json<Product>> {
    s.catalog.update_product(id, r).await.map(Json)
}

async fn delete_product(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    s.catalog.list_categories().await.map(Json)
}

async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Category>> {
    s.catalog.get_category(id).await.map(Json)
}

async fn create_category(State(s): State<AppState>, _: AdminCtx, Json(r): Json<CategoryRequest>) -> Result<(StatusCode, Json<Category>)> {
    let c = s.catalog.create_category(r).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

async fn update_category(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>, Json(r): Json<CategoryRequest>) -> Result<Json<Category>> {
    s.catalog.update_category(id, r).await.map(Json)
}

async fn delete_category(State(s): State<AppState>, _: AdminCtx, Path(id): Path<Uuid>) -> Result<StatusCode> {
    s.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
