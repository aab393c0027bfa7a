use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::api::{Payload, COUPON_CODE_REGEX};
use crate::cache::PRODUCT_LISTING_PREFIX;
use crate::cart::{CartTotals, CartView};
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use crate::store::OrderView;

//ROUTERS
pub fn cart_router(state: AppState) -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_product).delete(clear_cart))
        .route("/cart/quantity", put(update_quantity))
        .route("/cart/coupon", post(apply_coupon))
        .route("/cart/totals", get(get_totals))
        .route("/cart/checkout", post(checkout))
        .route("/cart/:product_id", delete(remove_product))
        .layer(Extension(state))
}

//ROUTES
async fn get_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.get_cart(claims.user_id).await?))
}

async fn add_product(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Payload(payload): Payload<CartItemPayload>,
) -> Result<Json<CartView>, ApiError> {
    let cart = state
        .carts
        .add_item(claims.user_id, payload.product_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

async fn update_quantity(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Payload(payload): Payload<CartItemPayload>,
) -> Result<Json<CartView>, ApiError> {
    let cart = state
        .carts
        .update_quantity(claims.user_id, payload.product_id, payload.quantity)
        .await?;
    Ok(Json(cart))
}

async fn remove_product(
    Path(product_id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(
        state.carts.remove_item(claims.user_id, product_id).await?,
    ))
}

async fn clear_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    state.carts.clear(claims.user_id).await?;
    Ok(Json(json!({
        "message": "Cart cleared successfully"
    })))
}

async fn apply_coupon(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Payload(payload): Payload<CouponPayload>,
) -> Result<Json<CartView>, ApiError> {
    payload.validate()?;
    let cart = state
        .carts
        .apply_coupon(claims.user_id, &payload.coupon_code)
        .await?;
    Ok(Json(cart))
}

async fn get_totals(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartTotals>, ApiError> {
    Ok(Json(state.carts.totals(claims.user_id).await?))
}

async fn checkout(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let order = state.carts.checkout(claims.user_id).await?;
    // Checkout took stock, so cached listings are stale.
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;
    Ok((StatusCode::CREATED, Json(order)))
}

//Structs
#[derive(Deserialize, Debug)]
struct CartItemPayload {
    product_id: i32,
    // Non-positive values are rejected by the cart service.
    quantity: i64,
}

#[derive(Deserialize, Validate, Debug)]
struct CouponPayload {
    #[validate(regex(path = *COUPON_CODE_REGEX, message = "Invalid coupon code"))]
    coupon_code: String,
}
