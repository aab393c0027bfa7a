pub mod cart;
pub mod order;
pub mod review;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState, Role};
use crate::state::AppState;
use cart::cart_router;
use order::order_router;
use review::review_router;

pub fn user_api_router(state: AppState) -> Router {
    let auth = AuthState {
        secret: state.config.secret.as_str().into(),
        role: Role::User,
    };

    Router::new()
        .merge(cart_router(state.clone()))
        .merge(order_router(state.clone()))
        .merge(review_router(state))
        .layer(from_fn_with_state(auth, auth_middleware))
}
