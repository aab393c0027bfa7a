pub mod coupon;
pub mod order;
pub mod product;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState, Role};
use crate::state::AppState;
use coupon::admin_coupon_router;
use order::admin_order_router;
use product::admin_product_router;

pub fn admin_api_router(state: AppState) -> Router {
    let auth = AuthState {
        secret: state.config.secret.as_str().into(),
        role: Role::Admin,
    };

    Router::new()
        .merge(admin_product_router(state.clone()))
        .merge(admin_coupon_router(state.clone()))
        .merge(admin_order_router(state))
        .layer(from_fn_with_state(auth, auth_middleware))
}
