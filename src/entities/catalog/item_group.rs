use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Node of the item group tree; the root is `All Item Groups`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    #[sea_orm(nullable)]
    pub parent_item_group: Option<String>,
    pub is_group: bool,
    #[sea_orm(nullable)]
    pub route: Option<String>,
    pub show_in_website: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const ROOT_ITEM_GROUP: &str = "All Item Groups";
