use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::api::public::product::ProductResponse;
use crate::cache::PRODUCT_LISTING_PREFIX;
use crate::api::Payload;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{NewProduct, ProductPatch};

//ROUTERS
pub fn admin_product_router(state: AppState) -> Router {
    Router::new()
        .route("/product", post(create_product))
        .route("/product/:id", patch(patch_product).delete(delete_product))
        .route("/product/:id/stock", post(adjust_stock))
        .route("/product/:id/review/:review_id", delete(remove_review))
        .layer(Extension(state))
}

//ROUTES
async fn create_product(
    Extension(state): Extension<AppState>,
    Payload(payload): Payload<CreateProduct>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    payload.validate()?;

    let product = state.products.create(payload.into()).await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = product.id, name = %product.name, "Created product");
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Payload(payload): Payload<PatchProductPayload>,
) -> Result<Json<ProductResponse>, ApiError> {
    payload.validate()?;

    let product = state.products.update(id, payload.into()).await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, "Patched product");
    Ok(Json(product.into()))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    state.products.soft_delete(id).await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, "Deleted product");
    Ok(Json(json!({
        "message": "Resource deleted successfully"
    })))
}

async fn adjust_stock(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Payload(payload): Payload<StockPayload>,
) -> Result<Json<ProductResponse>, ApiError> {
    payload.validate()?;

    let product = state.products.adjust_stock(id, payload.quantity).await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, quantity = payload.quantity, stock = product.stock, "Adjusted stock");
    Ok(Json(product.into()))
}

/// Moderation: removes any user's review.
async fn remove_review(
    Path((id, review_id)): Path<(i32, i32)>,
    Extension(state): Extension<AppState>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.reviews.remove(id, review_id, None).await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, review_id, "Removed review");
    Ok(Json(product.into()))
}

//Structs
#[derive(Deserialize, Validate, Clone, Debug)]
struct CreateProduct {
    #[validate(length(min = 1, max = 128))]
    name: String,
    #[validate(length(min = 1))]
    description: String,
    #[validate(length(min = 1, max = 64))]
    category: String,
    #[validate(range(min = 0.0))]
    price: f64,
    #[validate(range(min = 0))]
    stock: i32,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    discount: f64,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    tags: Vec<String>,
    is_featured: Option<bool>,
}

impl From<CreateProduct> for NewProduct {
    fn from(value: CreateProduct) -> Self {
        Self {
            name: value.name,
            description: value.description,
            category: value.category,
            price: value.price,
            stock: value.stock,
            discount: value.discount,
            tags: value.tags,
            is_featured: value.is_featured.unwrap_or(false),
        }
    }
}

#[derive(Deserialize, Validate, Debug)]
struct PatchProductPayload {
    #[validate(length(min = 1, max = 128))]
    name: Option<String>,
    #[validate(length(min = 1))]
    description: Option<String>,
    #[validate(length(min = 1, max = 64))]
    category: Option<String>,
    #[validate(range(min = 0.0))]
    price: Option<f64>,
    #[validate(range(min = 0))]
    stock: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    discount: Option<f64>,
    #[validate(custom(function = "validate_tags"))]
    tags: Option<Vec<String>>,
    is_featured: Option<bool>,
}

impl From<PatchProductPayload> for ProductPatch {
    fn from(value: PatchProductPayload) -> Self {
        Self {
            name: value.name,
            description: value.description,
            category: value.category,
            price: value.price,
            stock: value.stock,
            discount: value.discount,
            tags: value.tags,
            is_featured: value.is_featured,
        }
    }
}

#[derive(Deserialize, Validate, Debug)]
struct StockPayload {
    #[validate(range(min = 1))]
    quantity: u32,
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > 20 || tags.iter().any(|tag| tag.trim().is_empty() || tag.len() > 32) {
        return Err(ValidationError::new("tags"));
    }
    Ok(())
}
