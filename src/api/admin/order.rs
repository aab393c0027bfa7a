use axum::{
    extract::{Extension, Path},
    routing::patch,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::entities::order::{self, Status};
use crate::api::Payload;
use crate::error::ApiError;
use crate::state::AppState;

pub fn admin_order_router(state: AppState) -> Router {
    Router::new()
        .route("/order/:id", patch(set_order_status))
        .layer(Extension(state))
}

async fn set_order_status(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Payload(payload): Payload<StatusPayload>,
) -> Result<Json<order::Model>, ApiError> {
    let status: Status = payload
        .status
        .parse()
        .map_err(|_| ApiError::InvalidArgument(format!("Unknown order status: {}", payload.status)))?;

    let order = state.orders.set_status(id, status).await?;

    info!(order_id = id, %status, "Updated order status");
    Ok(Json(order))
}

#[derive(Deserialize, Debug)]
struct StatusPayload {
    status: String,
}
