pub mod admin;
pub mod public;
pub mod user;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;
use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub(crate) static COUPON_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,32}$").expect("coupon code pattern is valid"));

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            public_api_router(state.clone()).merge(user_api_router(state.clone())),
        )
        .nest("/api/admin", admin_api_router(state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// JSON request body whose rejections come back as `ApiError`.
pub(crate) struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string whose rejections come back as `ApiError`.
pub(crate) struct Params<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
