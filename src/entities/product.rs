use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use serde::{Deserialize, Serialize};

use crate::entities::review::Entity as Review;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(indexed)]
    pub category: String,
    pub price: f64,
    pub stock: i32,
    /// Percentage, 0..=100.
    pub discount: f64,
    #[sea_orm(column_type = "Json")]
    pub tags: Tags,
    /// Mean of all review ratings, 0 when there are none.
    #[sea_orm(default_value = 0.0)]
    pub rating_average: f64,
    #[sea_orm(default_value = 0)]
    pub rating_count: i32,
    #[sea_orm(default_value = false)]
    pub is_featured: bool,
    #[sea_orm(default_value = false)]
    #[serde(skip)]
    pub deleted: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Tags(pub Vec<String>);

impl Model {
    pub fn effective_price(&self) -> f64 {
        self.price * (1.0 - self.discount / 100.0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "Review")]
    Review,
}

impl Related<crate::entities::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
