use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::api::Params;
use crate::cache::PRODUCT_LISTING_PREFIX;
use crate::entities::{product, review};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{ProductPage, ProductQuery};

pub fn product_router(state: AppState) -> Router {
    Router::new()
        .route("/product", get(get_products))
        .route("/product/:id", get(get_product))
        .layer(Extension(state))
}

async fn get_products(
    Params(query): Params<ProductQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    query.validate()?;

    let key = listing_cache_key(&query)?;
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let page = state.products.list_active(&query).await?;
    let body = serde_json::to_value(ProductListResponse::from(page))
        .map_err(|err| ApiError::ServerError(err.to_string()))?;

    state.cache.put(key, body.clone()).await;
    Ok(Json(body))
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<Json<ProductDetails>, ApiError> {
    let product = state
        .products
        .find_active(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {id} id was found.")))?;
    let reviews = state.reviews.list_for_product(id).await?;

    Ok(Json(ProductDetails {
        product: product.into(),
        reviews,
    }))
}

fn listing_cache_key(query: &ProductQuery) -> Result<String, ApiError> {
    let params =
        serde_json::to_string(query).map_err(|err| ApiError::ServerError(err.to_string()))?;
    Ok(format!("{PRODUCT_LISTING_PREFIX}{params}"))
}

#[derive(Serialize)]
struct ProductListResponse {
    products: Vec<ProductResponse>,
    total_pages: u64,
    current_page: u64,
}

impl From<ProductPage> for ProductListResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            products: page.products.into_iter().map(ProductResponse::from).collect(),
            total_pages: page.total_pages,
            current_page: page.current_page,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ProductResponse {
    id: i32,
    name: String,
    description: String,
    category: String,
    price: f64,
    effective_price: f64,
    stock: i32,
    discount: f64,
    tags: Vec<String>,
    ratings: Ratings,
    is_featured: bool,
}

#[derive(Serialize)]
struct Ratings {
    average: f64,
    count: i32,
}

#[derive(Serialize)]
struct ProductDetails {
    #[serde(flatten)]
    product: ProductResponse,
    reviews: Vec<review::Model>,
}

impl From<product::Model> for ProductResponse {
    fn from(value: product::Model) -> Self {
        Self {
            effective_price: value.effective_price(),
            ratings: Ratings {
                average: value.rating_average,
                count: value.rating_count,
            },
            tags: value.tags.0,
            id: value.id,
            name: value.name,
            description: value.description,
            category: value.category,
            price: value.price,
            stock: value.stock,
            discount: value.discount,
            is_featured: value.is_featured,
        }
    }
}
