use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};

use super::{CartStore, StoreError};
use crate::cart::{Cart, CartLine};
use crate::entities::{cart, cart_line};

#[derive(Clone, Debug)]
pub struct CartRepository {
    db: Arc<DatabaseConnection>,
}

impl CartRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn find_by_user(&self, user_id: i32) -> Result<Option<Cart>, StoreError> {
        let txn = self.db.begin().await?;

        let Some(header) = cart::Entity::find_by_id(user_id).one(&txn).await? else {
            txn.commit().await?;
            return Ok(None);
        };

        let lines = cart_line::Entity::find()
            .filter(cart_line::Column::UserId.eq(user_id))
            .order_by_asc(cart_line::Column::Position)
            .all(&txn)
            .await?;

        txn.commit().await?;

        Ok(Some(Cart {
            user_id,
            lines: lines
                .into_iter()
                .map(|line| CartLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            discount: header.discount,
            version: header.version,
        }))
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, StoreError> {
        let txn = self.db.begin().await?;

        let version = if cart.version == 0 {
            let header = cart::ActiveModel {
                user_id: Set(cart.user_id),
                discount: Set(cart.discount),
                version: Set(1),
            };
            match cart::Entity::insert(header).exec(&txn).await {
                Ok(_) => 1,
                // Somebody else created the cart between our read and write.
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    txn.rollback().await?;
                    return Err(StoreError::VersionConflict);
                }
                Err(err) => return Err(err.into()),
            }
        } else {
            let result = cart::Entity::update_many()
                .col_expr(cart::Column::Discount, Expr::value(cart.discount))
                .col_expr(cart::Column::Version, Expr::col(cart::Column::Version).add(1))
                .filter(cart::Column::UserId.eq(cart.user_id))
                .filter(cart::Column::Version.eq(cart.version))
                .exec(&txn)
                .await?;

            if result.rows_affected == 0 {
                txn.rollback().await?;
                return Err(StoreError::VersionConflict);
            }
            cart.version + 1
        };

        cart_line::Entity::delete_many()
            .filter(cart_line::Column::UserId.eq(cart.user_id))
            .exec(&txn)
            .await?;

        if !cart.lines.is_empty() {
            let lines = cart
                .lines
                .iter()
                .enumerate()
                .map(|(position, line)| cart_line::ActiveModel {
                    user_id: Set(cart.user_id),
                    position: Set(position as i32),
                    product_id: Set(line.product_id),
                    quantity: Set(line.quantity),
                    ..Default::default()
                });
            cart_line::Entity::insert_many(lines).exec(&txn).await?;
        }

        txn.commit().await?;

        Ok(Cart {
            version,
            ..cart.clone()
        })
    }

    async fn delete_by_user(&self, user_id: i32) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        cart_line::Entity::delete_many()
            .filter(cart_line::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let result = cart::Entity::delete_by_id(user_id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }
}
