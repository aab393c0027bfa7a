use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::public::product::ProductResponse;
use crate::api::Payload;
use crate::cache::PRODUCT_LISTING_PREFIX;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use crate::store::NewReview;

pub fn review_router(state: AppState) -> Router {
    Router::new()
        .route("/product/:id/review", post(add_review))
        .route("/product/:id/review/:review_id", delete(remove_review))
        .layer(Extension(state))
}

async fn add_review(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    Payload(payload): Payload<ReviewPayload>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    payload.validate()?;

    let product = state
        .reviews
        .add(NewReview {
            product_id: id,
            user_id: claims.user_id,
            rating: payload.rating,
            comment: payload.comment,
        })
        .await?;
    // Ratings are part of every listing entry.
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, user_id = claims.user_id, rating = payload.rating, "Added review");
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Users can only remove their own reviews.
async fn remove_review(
    Path((id, review_id)): Path<(i32, i32)>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .reviews
        .remove(id, review_id, Some(claims.user_id))
        .await?;
    state.cache.invalidate(PRODUCT_LISTING_PREFIX).await;

    info!(product_id = id, review_id, user_id = claims.user_id, "Removed review");
    Ok(Json(product.into()))
}

#[derive(Deserialize, Validate, Debug)]
struct ReviewPayload {
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    #[validate(length(min = 1, max = 2000))]
    comment: String,
}
