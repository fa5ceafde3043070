use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quotation header
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub quotation_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    #[sea_orm(nullable)]
    pub contact_email: Option<String>,
    #[sea_orm(nullable)]
    pub contact_mobile: Option<String>,
    #[sea_orm(nullable)]
    pub tax_id: Option<String>,
    pub company: String,
    pub currency: String,
    pub transaction_date: NaiveDate,
    pub valid_till: NaiveDate,
    pub status: QuotationStatus,
    /// 0 draft, 1 submitted, 2 cancelled
    pub docstatus: i16,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_taxes_and_charges: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub grand_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub rounded_total: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,
    #[sea_orm(nullable)]
    pub payment_method: Option<String>,
    #[sea_orm(nullable)]
    pub paid_date: Option<NaiveDate>,
    #[sea_orm(nullable)]
    pub sales_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::quotation_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::quotation_comment::Entity")]
    Comments,
}

impl Related<super::quotation_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::quotation_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A sales order was raised from this quotation; that link never goes away.
    pub fn is_converted(&self) -> bool {
        self.sales_order_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum QuotationStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Submitted")]
    Submitted,
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "Replied")]
    Replied,
    #[sea_orm(string_value = "Partially Ordered")]
    PartiallyOrdered,
    #[sea_orm(string_value = "Ordered")]
    Ordered,
    #[sea_orm(string_value = "Lost")]
    Lost,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Expired")]
    Expired,
}

impl QuotationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Open => "Open",
            Self::Replied => "Replied",
            Self::PartiallyOrdered => "Partially Ordered",
            Self::Ordered => "Ordered",
            Self::Lost => "Lost",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
        }
    }

    /// Status as the storefront shows it.
    pub fn storefront_status(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted | Self::Open | Self::Replied => "sent",
            Self::PartiallyOrdered | Self::Ordered => "approved",
            Self::Lost | Self::Cancelled => "rejected",
            Self::Expired => "expired",
        }
    }

    /// Inverse mapping used when the storefront changes a status.
    pub fn from_storefront(status: &str) -> Option<Self> {
        match status {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Submitted),
            "approved" | "paid" => Some(Self::Ordered),
            "rejected" => Some(Self::Lost),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Draft | Self::Expired | Self::Lost | Self::Cancelled)
    }
}
