use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// In-app notification addressed to a user by email
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_email: String,
    pub subject: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    #[sea_orm(nullable)]
    pub document_type: Option<String>,
    #[sea_orm(nullable)]
    pub document_name: Option<String>,
    pub is_read: bool,
    #[sea_orm(nullable)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
