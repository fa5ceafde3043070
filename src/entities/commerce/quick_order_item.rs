use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quick_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quick_order_id: Uuid,
    pub item_code: String,
    pub item_name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub qty: Decimal,
    #[sea_orm(nullable)]
    pub uom: Option<String>,
    pub idx: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quick_order::Entity",
        from = "Column::QuickOrderId",
        to = "super::quick_order::Column::Id",
        on_delete = "Cascade"
    )]
    QuickOrder,
}

impl Related<super::quick_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuickOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
