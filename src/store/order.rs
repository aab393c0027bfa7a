use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use super::{product::subtract_stock, OrderStore, StoreError};
use crate::entities::{
    cart, cart_line,
    order::{self, Entity as OrderEntity, Status},
    order_part::{self, Entity as OrderPartEntity},
};

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrderPart {
    pub product_id: i32,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub user_id: i32,
    /// Version of the cart the order was priced from.
    pub cart_version: i32,
    pub discount: f64,
    pub total: f64,
    pub parts: Vec<NewOrderPart>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub parts: Vec<order_part::Model>,
}

#[derive(Clone, Debug)]
pub struct OrderRepository {
    db: Arc<DatabaseConnection>,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn place_order(&self, new: NewOrder) -> Result<OrderView, StoreError> {
        let txn = self.db.begin().await?;

        cart_line::Entity::delete_many()
            .filter(cart_line::Column::UserId.eq(new.user_id))
            .exec(&txn)
            .await?;
        let claimed = cart::Entity::delete_many()
            .filter(cart::Column::UserId.eq(new.user_id))
            .filter(cart::Column::Version.eq(new.cart_version))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::VersionConflict);
        }

        for part in &new.parts {
            if let Err(err) = subtract_stock(&txn, part.product_id, part.quantity).await {
                txn.rollback().await?;
                return Err(err);
            }
        }

        let order = order::ActiveModel {
            user_id: Set(new.user_id),
            status: Set(Status::Created),
            discount: Set(new.discount),
            total: Set(new.total),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut parts = Vec::with_capacity(new.parts.len());
        for part in new.parts {
            let part = order_part::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(part.product_id),
                quantity: Set(part.quantity),
                unit_price: Set(part.unit_price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            parts.push(part);
        }

        txn.commit().await?;

        Ok(OrderView { order, parts })
    }

    async fn list_for_user(&self, user_id: i32) -> Result<Vec<OrderView>, StoreError> {
        let orders = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::Id)
            .find_with_related(OrderPartEntity)
            .all(&*self.db)
            .await?;

        Ok(orders
            .into_iter()
            .map(|(order, parts)| OrderView { order, parts })
            .collect())
    }

    async fn set_status(&self, id: i32, status: Status) -> Result<order::Model, StoreError> {
        let existing = OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(StoreError::NotFound("Order"))?;

        let mut order: order::ActiveModel = existing.into();
        order.status = Set(status);

        Ok(order.update(&*self.db).await?)
    }
}
