use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{CouponStore, StoreError};
use crate::entities::coupon::{self, Entity as CouponEntity};

#[derive(Clone, Debug, PartialEq)]
pub struct NewCoupon {
    pub code: String,
    pub discount: f64,
    pub expiry: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Clone, Debug)]
pub struct CouponRepository {
    db: Arc<DatabaseConnection>,
}

impl CouponRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CouponStore for CouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<coupon::Model>, StoreError> {
        Ok(CouponEntity::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&*self.db)
            .await?)
    }

    async fn create(&self, new: NewCoupon) -> Result<coupon::Model, StoreError> {
        coupon::ActiveModel {
            code: Set(new.code),
            discount: Set(new.discount),
            expiry: Set(new.expiry),
            is_active: Set(new.is_active),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| StoreError::from_write(err, "Coupon"))
    }

    async fn list(&self) -> Result<Vec<coupon::Model>, StoreError> {
        Ok(CouponEntity::find()
            .order_by_asc(coupon::Column::Id)
            .all(&*self.db)
            .await?)
    }
}
