use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::cache::{MemoryCache, ProductCache};
use crate::cart::CartService;
use crate::config::Config;
use crate::store::{
    CartRepository, CouponRepository, CouponStore, OrderRepository, OrderStore, ProductRepository,
    ProductStore, ReviewRepository, ReviewStore,
};

/// Shared by every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub products: Arc<dyn ProductStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub orders: Arc<dyn OrderStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub carts: CartService,
    pub cache: Arc<dyn ProductCache>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: Config) -> Self {
        let products: Arc<dyn ProductStore> = Arc::new(ProductRepository::new(db.clone()));
        let coupons: Arc<dyn CouponStore> = Arc::new(CouponRepository::new(db.clone()));
        let orders: Arc<dyn OrderStore> = Arc::new(OrderRepository::new(db.clone()));
        let reviews: Arc<dyn ReviewStore> = Arc::new(ReviewRepository::new(db.clone()));
        let carts = CartService::new(
            products.clone(),
            Arc::new(CartRepository::new(db)),
            coupons.clone(),
            orders.clone(),
            config.cart_write_attempts,
        );
        let cache = Arc::new(MemoryCache::new(config.product_cache_ttl));

        Self {
            config: Arc::new(config),
            products,
            coupons,
            orders,
            reviews,
            carts,
            cache,
        }
    }
}
