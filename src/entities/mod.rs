pub mod cart;
pub mod cart_line;
pub mod coupon;
pub mod order;
pub mod order_part;
pub mod product;
pub mod review;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, Schema, Set,
};
use tracing::info;

use crate::entities::{
    cart::Entity as Cart, cart_line::Entity as CartLine, coupon::Entity as Coupon,
    order::Entity as Order, order_part::Entity as OrderPart, product::Entity as Product,
    review::Entity as Review,
};

pub const DEMO_COUPON_CODE: &str = "SAVE10";

/// Every pooled connection to `sqlite::memory:` would open its own empty
/// database, so in-memory URLs are pinned to a single connection.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    Database::connect(options).await
}

/// Creates every table that does not exist yet. Referenced tables come first.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = [
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Review),
        schema.create_table_from_entity(Coupon),
        schema.create_table_from_entity(Cart),
        schema.create_table_from_entity(CartLine),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderPart),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(&*statement)).await?;
    }

    Ok(())
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let existing = Coupon::find()
        .filter(coupon::Column::Code.eq(DEMO_COUPON_CODE))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    coupon::ActiveModel {
        code: Set(DEMO_COUPON_CODE.to_owned()),
        discount: Set(10.0),
        expiry: Set(Utc::now() + Duration::days(365)),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(code = DEMO_COUPON_CODE, "Seeded demo coupon");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_seed_is_idempotent() {
        let db = connect("sqlite::memory:").await.unwrap();
        setup_schema(&db).await.unwrap();

        seed_demo_data(&db).await.unwrap();
        seed_demo_data(&db).await.unwrap();

        let coupons = Coupon::find().all(&db).await.unwrap();
        assert_eq!(coupons.len(), 1);
        assert_eq!(coupons[0].code, DEMO_COUPON_CODE);
        assert!(coupons[0].is_usable_at(Utc::now()));
    }
}
