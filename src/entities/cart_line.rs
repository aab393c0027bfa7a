use sea_orm::entity::prelude::*;
use crate::entities::cart::Entity as Cart;
use crate::entities::product::Entity as Product;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_line")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub user_id: i32,
    /// Insertion order of the line inside its cart.
    pub position: i32,
    pub product_id: i32,
    pub quantity: u32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Cart",
        from = "crate::entities::cart_line::Column::UserId",
        to = "crate::entities::cart::Column::UserId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Cart,
    #[sea_orm(
        belongs_to = "Product",
        from = "crate::entities::cart_line::Column::ProductId",
        to = "crate::entities::product::Column::Id",
    )]
    Product,
}

impl ActiveModelBehavior for ActiveModel {}

impl Related<crate::entities::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}
