//! Products and categories

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use super::extract::{Path, Query as QueryParams, ValidatedJson};
use super::{created, done, ok, Envelope};
use crate::domain::aggregates::{Category, Product, ProductStatus, RatingSummary, Review};
use crate::domain::value_objects::{Money, Slug, Sku};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{Page, Paginated, Query, Store};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:key", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/:key", get(get_category))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin_list_products).post(create_product))
        .route("/products/:id", get(admin_get_product).put(update_product).delete(delete_product))
        .route("/categories", axum::routing::post(create_category))
        .route("/categories/:id", axum::routing::put(update_category).delete(delete_category))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub status: Option<ProductStatus>,
}

impl ProductListParams {
    fn page(&self) -> Page { Page::new(self.page.unwrap_or(1), self.per_page.unwrap_or(20)) }

    fn query(&self) -> Query {
        let mut q = Query::new();
        if let Some(category) = self.category { q = q.filter("category_id", category); }
        if let Some(featured) = self.featured { q = q.filter("featured", featured); }
        if let Some(tag) = &self.tag { q = q.includes("tags", tag); }
        if let Some(search) = &self.search { q = q.search("name", search.clone()); }
        q
    }
}

/// Look a product up by id or slug.
pub async fn find_product(store: &Store, key: &str) -> ApiResult<Product> {
    let found = match Uuid::parse_str(key) {
        Ok(id) => store.get::<Product>(id).await?,
        Err(_) => store.find_one(Query::new().filter("slug", key)).await?,
    };
    found.ok_or(ApiError::NotFound("product"))
}

async fn list_products(State(s): State<AppState>, QueryParams(p): QueryParams<ProductListParams>) -> ApiResult<Json<Envelope<Paginated<Product>>>> {
    let query = p.query().filter("status", ProductStatus::Active);
    Ok(ok(s.store.page(query, p.page()).await?))
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub sale_percent: Option<u32>,
    pub rating: RatingSummary,
}

async fn get_product(State(s): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Envelope<ProductDetail>>> {
    let mut product = find_product(&s.store, &key).await?;
    if !product.is_active() { return Err(ApiError::NotFound("product")); }

    product.record_view();
    s.store.save(&product).await?;

    let category = match product.category_id {
        Some(id) => s.store.get::<Category>(id).await?,
        None => None,
    };
    let approved: Vec<Review> = s.store.find(&Query::new().filter("product_id", product.id).filter("approved", true)).await?;
    Ok(ok(ProductDetail {
        sale_percent: product.sale_percent(),
        rating: RatingSummary::from_reviews(&approved),
        category,
        product,
    }))
}

async fn admin_list_products(State(s): State<AppState>, QueryParams(p): QueryParams<ProductListParams>) -> ApiResult<Json<Envelope<Paginated<Product>>>> {
    let mut query = p.query();
    if let Some(status) = p.status { query = query.filter("status", status); }
    Ok(ok(s.store.page(query, p.page()).await?))
}

async fn admin_get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Envelope<Product>>> {
    Ok(ok(s.store.get(id).await?.ok_or(ApiError::NotFound("product"))?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 50))]
    pub sku: Option<String>,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub tags: Vec<String>,
}

impl ProductRequest {
    /// Write the request onto `product`, keeping identity and counters.
    fn apply(self, product: &mut Product) -> ApiResult<()> {
        product.slug = Slug::new(self.slug.as_deref().unwrap_or(&self.name))?;
        if let Some(sku) = self.sku { product.sku = Sku::new(sku)?; }
        product.name = self.name.trim().to_string();
        product.description = self.description;
        product.price = Money::non_negative(self.price)?;
        product.compare_at_price = self.compare_at_price.map(Money::non_negative).transpose()?;
        product.category_id = self.category_id;
        product.images = self.images;
        product.stock = self.stock;
        product.status = self.status;
        product.featured = self.featured;
        product.tags = self.tags.into_iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect();
        product.touch();
        Ok(())
    }
}

async fn ensure_category(store: &Store, id: Option<Uuid>) -> ApiResult<()> {
    match id {
        Some(id) if store.get::<Category>(id).await?.is_none() => Err(ApiError::BadRequest(format!("category {id} does not exist"))),
        _ => Ok(()),
    }
}

async fn create_product(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<ProductRequest>) -> ApiResult<(axum::http::StatusCode, Json<Envelope<Product>>)> {
    ensure_category(&s.store, r.category_id).await?;
    let mut product = Product::create(Sku::generate(), r.name.clone(), Slug::new(&r.name)?, Money::ZERO);
    r.apply(&mut product)?;
    s.store.insert(&product).await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    Ok(created(product))
}

async fn update_product(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<ProductRequest>) -> ApiResult<Json<Envelope<Product>>> {
    ensure_category(&s.store, r.category_id).await?;
    let mut product: Product = s.store.fetch(id).await?;
    r.apply(&mut product)?;
    s.store.save(&product).await?;
    Ok(ok(product))
}

async fn delete_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    if !s.store.delete::<Product>(id).await? { return Err(ApiError::NotFound("product")); }
    tracing::info!(product_id = %id, "product deleted");
    Ok(done("product deleted"))
}

async fn list_categories(State(s): State<AppState>) -> ApiResult<Json<Envelope<Vec<Category>>>> {
    let mut categories: Vec<Category> = s.store.find(&Query::new()).await?;
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(ok(categories))
}

async fn get_category(State(s): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Envelope<Category>>> {
    let found = match Uuid::parse_str(&key) {
        Ok(id) => s.store.get::<Category>(id).await?,
        Err(_) => s.store.find_one(Query::new().filter("slug", &key)).await?,
    };
    Ok(ok(found.ok_or(ApiError::NotFound("category"))?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl CategoryRequest {
    fn apply(self, category: &mut Category) -> ApiResult<()> {
        category.slug = Slug::new(self.slug.as_deref().unwrap_or(&self.name))?;
        category.name = self.name.trim().to_string();
        category.description = self.description;
        category.image = self.image;
        category.parent_id = self.parent_id;
        category.updated_at = chrono::Utc::now();
        Ok(())
    }
}

async fn create_category(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<CategoryRequest>) -> ApiResult<(axum::http::StatusCode, Json<Envelope<Category>>)> {
    ensure_category(&s.store, r.parent_id).await?;
    let mut category = Category::create(r.name.clone(), Slug::new(&r.name)?);
    r.apply(&mut category)?;
    s.store.insert(&category).await?;
    Ok(created(category))
}

async fn update_category(State(s): State<AppState>, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<CategoryRequest>) -> ApiResult<Json<Envelope<Category>>> {
    if r.parent_id == Some(id) { return Err(ApiError::BadRequest("a category cannot be its own parent".into())); }
    ensure_category(&s.store, r.parent_id).await?;
    let mut category: Category = s.store.fetch(id).await?;
    r.apply(&mut category)?;
    s.store.save(&category).await?;
    Ok(ok(category))
}

async fn delete_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    let in_use = s.store.count::<Product>(&Query::new().filter("category_id", id)).await?;
    if in_use > 0 {
        return Err(ApiError::Conflict(format!("category is used by {in_use} products")));
    }
    if !s.store.delete::<Category>(id).await? { return Err(ApiError::NotFound("category")); }
    Ok(done("category deleted"))
}
