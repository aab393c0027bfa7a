pub mod product;

use axum::Router;

use crate::state::AppState;
use product::product_router;

pub fn public_api_router(state: AppState) -> Router {
    Router::new().merge(product_router(state))
}
