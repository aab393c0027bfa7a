//! Persistence seams.
//!
//! The cart service only talks to these traits; the sea-orm backed
//! repositories in the submodules are the production implementations.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::cart::Cart;
use crate::entities::{
    coupon as coupon_entity, order as order_entity, product as product_entity,
    review as review_entity,
};
use crate::error::ApiError;

pub use self::cart::CartRepository;
pub use self::coupon::{CouponRepository, NewCoupon};
pub use self::order::{NewOrder, NewOrderPart, OrderRepository, OrderView};
pub use self::product::{NewProduct, ProductPage, ProductPatch, ProductQuery, ProductRepository};
pub use self::review::{NewReview, ReviewRepository};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("record was modified concurrently")]
    VersionConflict,
    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i32 },
}

impl StoreError {
    /// Maps unique-constraint violations onto `Duplicate`.
    pub(crate) fn from_write(err: DbErr, what: &'static str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate(what),
            _ => StoreError::Db(err),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Db(err) => err.into(),
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            StoreError::Duplicate(what) => ApiError::Conflict(format!("{what} already exists")),
            StoreError::VersionConflict => ApiError::Conflict(
                "Cart was modified by another request, please retry".into(),
            ),
            StoreError::InsufficientStock { product_id } => {
                ApiError::InvalidArgument(format!("Insufficient stock for product {product_id}"))
            }
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Soft-deleted products are never returned.
    async fn find_active(&self, id: i32) -> Result<Option<product_entity::Model>, StoreError>;

    /// Soft-deleted and unknown ids are silently skipped.
    async fn find_active_many(&self, ids: &[i32]) -> Result<Vec<product_entity::Model>, StoreError>;

    async fn list_active(&self, query: &ProductQuery) -> Result<ProductPage, StoreError>;

    async fn create(&self, product: NewProduct) -> Result<product_entity::Model, StoreError>;

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<product_entity::Model, StoreError>;

    async fn soft_delete(&self, id: i32) -> Result<(), StoreError>;

    /// Subtracts `quantity` from stock. Refuses to go below zero.
    async fn adjust_stock(&self, id: i32, quantity: u32) -> Result<product_entity::Model, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_by_user(&self, user_id: i32) -> Result<Option<Cart>, StoreError>;

    /// Inserts a cart with `version == 0`, otherwise updates it only if the
    /// stored version still equals `cart.version`. Returns the cart with its
    /// new version.
    async fn save(&self, cart: &Cart) -> Result<Cart, StoreError>;

    /// Returns whether a cart existed.
    async fn delete_by_user(&self, user_id: i32) -> Result<bool, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<coupon_entity::Model>, StoreError>;

    async fn create(&self, coupon: NewCoupon) -> Result<coupon_entity::Model, StoreError>;

    async fn list(&self) -> Result<Vec<coupon_entity::Model>, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically consumes the cart at `order.cart_version`, takes the stock
    /// and records the order.
    async fn place_order(&self, order: NewOrder) -> Result<OrderView, StoreError>;

    async fn list_for_user(&self, user_id: i32) -> Result<Vec<OrderView>, StoreError>;

    async fn set_status(
        &self,
        id: i32,
        status: order_entity::Status,
    ) -> Result<order_entity::Model, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Newest first.
    async fn list_for_product(&self, product_id: i32) -> Result<Vec<review_entity::Model>, StoreError>;

    /// Records the review and refreshes the product's rating summary.
    /// Returns the updated product.
    async fn add(&self, review: NewReview) -> Result<product_entity::Model, StoreError>;

    /// With `author` set, only that user's review matches.
    async fn remove(
        &self,
        product_id: i32,
        review_id: i32,
        author: Option<i32>,
    ) -> Result<product_entity::Model, StoreError>;
}

/// Connection helper shared by the repository tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use sea_orm::DatabaseConnection;

    use crate::entities::{connect, setup_schema};

    pub async fn memory_db() -> Arc<DatabaseConnection> {
        let db = connect("sqlite::memory:").await.unwrap();
        setup_schema(&db).await.unwrap();
        Arc::new(db)
    }
}
