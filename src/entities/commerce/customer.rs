use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer record; storefront users reach it through `user_id` or a website link
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_name: String,
    pub customer_type: CustomerType,
    pub customer_group: String,
    pub territory: String,
    #[sea_orm(nullable)]
    pub mobile_no: Option<String>,
    #[sea_orm(nullable)]
    pub email_id: Option<String>,
    /// GSTIN for business customers
    #[sea_orm(nullable)]
    pub tax_id: Option<String>,
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::auth::user::Entity",
        from = "Column::UserId",
        to = "crate::auth::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::quick_order::Entity")]
    QuickOrders,
}

impl Related<crate::auth::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::quick_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuickOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CustomerType {
    #[sea_orm(string_value = "Individual")]
    Individual,
    #[sea_orm(string_value = "Company")]
    Company,
}

pub const DEFAULT_TERRITORY: &str = "India";
pub const INDIVIDUAL_GROUP: &str = "Individual";
pub const COMMERCIAL_GROUP: &str = "Commercial";
