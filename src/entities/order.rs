use crate::entities::order_part::Entity as OrderPart;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::{fmt, str::FromStr};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub status: Status,
    pub discount: f64,
    pub total: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "OrderPart")]
    OrderPart,
}

impl Related<crate::entities::order_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderPart.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    enum_name = "status_enum",
    db_type = "String(StringLen::N(255))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "arriving")]
    Arriving,
    #[sea_orm(string_value = "waiting")]
    Waiting,
    #[sea_orm(string_value = "received")]
    Received,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "processing" => Ok(Self::Processing),
            "arriving" => Ok(Self::Arriving),
            "waiting" => Ok(Self::Waiting),
            "received" => Ok(Self::Received),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Created => "created",
            Self::Processing => "processing",
            Self::Arriving => "arriving",
            Self::Waiting => "waiting",
            Self::Received => "received",
        };
        f.write_str(value)
    }
}
