use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grants a user access to a company or customer record.
///
/// New links created during onboarding against an existing customer start
/// disabled until staff approve them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_website_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_email: String,
    pub link_document_type: String,
    pub link_name: String,
    pub role_profile: String,
    pub is_primary: bool,
    pub is_disable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const CUSTOMER_DOCUMENT: &str = "Customer";
pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_USER: &str = "User";
