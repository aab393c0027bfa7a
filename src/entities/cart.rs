use sea_orm::entity::prelude::*;
use crate::entities::cart_line::Entity as CartLine;

/// One cart per user; the lines live in `cart_line`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    pub discount: f64,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "CartLine")]
    CartLine,
}

impl Related<crate::entities::cart_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
