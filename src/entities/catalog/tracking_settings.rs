use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-row analytics settings, stored under id 1
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tracking_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(nullable)]
    pub ga_id: Option<String>,
    #[sea_orm(nullable)]
    pub meta_pixel_id: Option<String>,
    pub enable_tracking: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const SETTINGS_ID: i32 = 1;
