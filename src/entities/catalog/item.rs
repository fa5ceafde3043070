use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock item master. Variants point at their template through `variant_of`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_code: String,
    pub item_name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(nullable)]
    pub image: Option<String>,
    #[sea_orm(nullable)]
    pub item_group: Option<String>,
    #[sea_orm(nullable)]
    pub stock_uom: Option<String>,
    pub has_variants: bool,
    #[sea_orm(nullable)]
    pub variant_of: Option<String>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_variant_attribute::Entity")]
    VariantAttributes,
}

impl Related<super::item_variant_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantAttributes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
