use axum::{extract::Extension, routing::get, Json, Router};

use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use crate::store::OrderView;

pub fn order_router(state: AppState) -> Router {
    Router::new()
        .route("/order", get(get_orders))
        .layer(Extension(state))
}

/// Newest first.
async fn get_orders(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orders.list_for_user(claims.user_id).await?))
}
