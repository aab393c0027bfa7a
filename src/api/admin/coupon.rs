use axum::{extract::Extension, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::{Payload, COUPON_CODE_REGEX};
use crate::entities::coupon;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::NewCoupon;

pub fn admin_coupon_router(state: AppState) -> Router {
    Router::new()
        .route("/coupon", get(list_coupons).post(create_coupon))
        .layer(Extension(state))
}

async fn list_coupons(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<coupon::Model>>, ApiError> {
    Ok(Json(state.coupons.list().await?))
}

async fn create_coupon(
    Extension(state): Extension<AppState>,
    Payload(payload): Payload<CreateCoupon>,
) -> Result<(StatusCode, Json<coupon::Model>), ApiError> {
    payload.validate()?;
    if payload.expiry <= Utc::now() {
        return Err(ApiError::InvalidArgument(
            "Coupon expiry must be in the future".into(),
        ));
    }

    let coupon = state
        .coupons
        .create(NewCoupon {
            code: payload.code,
            discount: payload.discount,
            expiry: payload.expiry,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;

    info!(code = %coupon.code, discount = coupon.discount, "Created coupon");
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[derive(Deserialize, Validate, Debug)]
struct CreateCoupon {
    #[validate(regex(path = *COUPON_CODE_REGEX, message = "Invalid coupon code"))]
    code: String,
    #[validate(range(min = 0.0, max = 100.0))]
    discount: f64,
    expiry: DateTime<Utc>,
    is_active: Option<bool>,
}
