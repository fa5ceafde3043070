use crate::{
    entities::commerce::{
        address,
        dynamic_link::{self, ADDRESS_PARENT, CUSTOMER_LINK},
        Address, AddressModel, Customer, DynamicLink,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_ADDRESS_TYPE: &str = "Billing";
const DEFAULT_COUNTRY: &str = "India";

/// Body of a new address
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 140, message = "address_title is required"))]
    pub address_title: String,
    pub address_type: Option<String>,
    #[validate(length(min = 1, max = 240, message = "address_line1 is required"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 140, message = "city is required"))]
    pub city: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email_id: Option<String>,
    #[serde(default)]
    pub is_primary_address: bool,
    #[serde(default)]
    pub is_shipping_address: bool,
}

/// Partial update; only these fields can change.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddressUpdate {
    pub address_title: Option<String>,
    pub address_type: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub is_primary_address: Option<bool>,
    pub is_shipping_address: Option<bool>,
    pub disabled: Option<bool>,
}

impl AddressUpdate {
    fn is_empty(&self) -> bool {
        self.address_title.is_none()
            && self.address_type.is_none()
            && self.address_line1.is_none()
            && self.address_line2.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.pincode.is_none()
            && self.phone.is_none()
            && self.is_primary_address.is_none()
            && self.is_shipping_address.is_none()
            && self.disabled.is_none()
    }
}

/// Address as listed for a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSummary {
    pub name: Uuid,
    pub phone: Option<String>,
    pub address_title: String,
    pub address_type: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub pincode: Option<String>,
    pub is_primary_address: bool,
    pub is_shipping_address: bool,
}

impl From<AddressModel> for AddressSummary {
    fn from(model: AddressModel) -> Self {
        Self {
            name: model.id,
            phone: model.phone,
            address_title: model.address_title,
            address_type: model.address_type,
            address_line1: model.address_line1,
            address_line2: model.address_line2,
            city: model.city,
            state: model.state,
            country: model.country,
            pincode: model.pincode,
            is_primary_address: model.is_primary_address,
            is_shipping_address: model.is_shipping_address,
        }
    }
}

/// Inserts an address and links it to `customer_id` on `conn`.
pub async fn insert_customer_address<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
    input: AddressInput,
) -> Result<AddressModel, DbErr> {
    let now = Utc::now();
    let address = address::ActiveModel {
        id: Set(Uuid::new_v4()),
        address_title: Set(input.address_title),
        address_type: Set(input
            .address_type
            .unwrap_or_else(|| DEFAULT_ADDRESS_TYPE.to_string())),
        address_line1: Set(input.address_line1),
        address_line2: Set(input.address_line2),
        city: Set(input.city),
        state: Set(input.state),
        country: Set(input
            .country
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
        pincode: Set(input.pincode),
        phone: Set(input.phone),
        email_id: Set(input.email_id),
        is_primary_address: Set(input.is_primary_address),
        is_shipping_address: Set(input.is_shipping_address),
        disabled: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    insert_link(conn, address.id, CUSTOMER_LINK, &customer_id.to_string()).await?;
    Ok(address)
}

async fn insert_link<C: ConnectionTrait>(
    conn: &C,
    address_id: Uuid,
    link_doctype: &str,
    link_name: &str,
) -> Result<dynamic_link::Model, DbErr> {
    dynamic_link::ActiveModel {
        id: Set(Uuid::new_v4()),
        parent_type: Set(ADDRESS_PARENT.to_string()),
        parent_id: Set(address_id.to_string()),
        link_doctype: Set(link_doctype.to_string()),
        link_name: Set(link_name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await
}

/// True when a dynamic link ties the address to the customer.
pub async fn is_address_linked<C: ConnectionTrait>(
    conn: &C,
    address_id: Uuid,
    customer_id: Uuid,
) -> Result<bool, DbErr> {
    let link = DynamicLink::find()
        .filter(dynamic_link::Column::ParentType.eq(ADDRESS_PARENT))
        .filter(dynamic_link::Column::ParentId.eq(address_id.to_string()))
        .filter(dynamic_link::Column::LinkDoctype.eq(CUSTOMER_LINK))
        .filter(dynamic_link::Column::LinkName.eq(customer_id.to_string()))
        .one(conn)
        .await?;
    Ok(link.is_some())
}

/// Customer addresses, owned through `dynamic_links`.
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn ensure_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    async fn ensure_owned(&self, customer_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        if is_address_linked(&*self.db, address_id, customer_id).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "Address not found or unauthorized".to_string(),
            ))
        }
    }

    /// Enabled addresses of a customer, most recently modified first.
    #[instrument(skip(self))]
    pub async fn list_addresses(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<AddressSummary>, ServiceError> {
        self.ensure_customer(customer_id).await?;

        let address_ids: Vec<Uuid> = DynamicLink::find()
            .filter(dynamic_link::Column::ParentType.eq(ADDRESS_PARENT))
            .filter(dynamic_link::Column::LinkDoctype.eq(CUSTOMER_LINK))
            .filter(dynamic_link::Column::LinkName.eq(customer_id.to_string()))
            .all(&*self.db)
            .await?
            .iter()
            .filter_map(|link| Uuid::parse_str(&link.parent_id).ok())
            .collect();

        if address_ids.is_empty() {
            return Ok(Vec::new());
        }

        let addresses = Address::find()
            .filter(address::Column::Id.is_in(address_ids))
            .filter(address::Column::Disabled.eq(false))
            .order_by_desc(address::Column::UpdatedAt)
            .all(&*self.db)
            .await?;

        Ok(addresses.into_iter().map(AddressSummary::from).collect())
    }

    /// Creates the address and its customer link in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_address(
        &self,
        customer_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        self.ensure_customer(customer_id).await?;

        let txn = self.db.begin().await?;
        let address = insert_customer_address(&txn, customer_id, input).await?;
        txn.commit().await?;

        info!(address_id = %address.id, customer_id = %customer_id, "Address created");
        Ok(address)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
        changes: AddressUpdate,
    ) -> Result<AddressModel, ServiceError> {
        self.ensure_customer(customer_id).await?;
        if changes.is_empty() {
            return Err(ServiceError::ValidationError(
                "address_data is required".to_string(),
            ));
        }
        self.ensure_owned(customer_id, address_id).await?;

        let existing = Address::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Address not found".to_string()))?;

        let mut model: address::ActiveModel = existing.into();
        if let Some(v) = changes.address_title {
            model.address_title = Set(v);
        }
        if let Some(v) = changes.address_type {
            model.address_type = Set(v);
        }
        if let Some(v) = changes.address_line1 {
            model.address_line1 = Set(v);
        }
        if let Some(v) = changes.address_line2 {
            model.address_line2 = Set(Some(v));
        }
        if let Some(v) = changes.city {
            model.city = Set(v);
        }
        if let Some(v) = changes.state {
            model.state = Set(Some(v));
        }
        if let Some(v) = changes.country {
            model.country = Set(v);
        }
        if let Some(v) = changes.pincode {
            model.pincode = Set(Some(v));
        }
        if let Some(v) = changes.phone {
            model.phone = Set(Some(v));
        }
        if let Some(v) = changes.is_primary_address {
            model.is_primary_address = Set(v);
        }
        if let Some(v) = changes.is_shipping_address {
            model.is_shipping_address = Set(v);
        }
        if let Some(v) = changes.disabled {
            model.disabled = Set(v);
        }
        model.updated_at = Set(Utc::now());

        Ok(model.update(&*self.db).await?)
    }

    /// Removes the address together with all of its links.
    #[instrument(skip(self))]
    pub async fn delete_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.ensure_customer(customer_id).await?;
        self.ensure_owned(customer_id, address_id).await?;

        let txn = self.db.begin().await?;
        DynamicLink::delete_many()
            .filter(dynamic_link::Column::ParentType.eq(ADDRESS_PARENT))
            .filter(dynamic_link::Column::ParentId.eq(address_id.to_string()))
            .exec(&txn)
            .await?;
        if let Some(address) = Address::find_by_id(address_id).one(&txn).await? {
            address.delete(&txn).await?;
        }
        txn.commit().await?;

        info!(address_id = %address_id, "Address deleted");
        Ok(())
    }

    pub async fn get_address(&self, address_id: Uuid) -> Result<AddressModel, ServiceError> {
        Address::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Address not found".to_string()))
    }

    /// Customers an address is linked to.
    pub async fn linked_customers(&self, address_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        Ok(DynamicLink::find()
            .filter(dynamic_link::Column::ParentType.eq(ADDRESS_PARENT))
            .filter(dynamic_link::Column::ParentId.eq(address_id.to_string()))
            .filter(dynamic_link::Column::LinkDoctype.eq(CUSTOMER_LINK))
            .all(&*self.db)
            .await?
            .iter()
            .filter_map(|link| Uuid::parse_str(&link.link_name).ok())
            .collect())
    }

    /// Adds a link unless the same one already exists.
    #[instrument(skip(self))]
    pub async fn link_address(
        &self,
        address_id: Uuid,
        link_doctype: &str,
        link_name: &str,
    ) -> Result<String, ServiceError> {
        self.get_address(address_id).await?;

        let existing = DynamicLink::find()
            .filter(dynamic_link::Column::ParentType.eq(ADDRESS_PARENT))
            .filter(dynamic_link::Column::ParentId.eq(address_id.to_string()))
            .filter(dynamic_link::Column::LinkDoctype.eq(link_doctype))
            .filter(dynamic_link::Column::LinkName.eq(link_name))
            .one(&*self.db)
            .await?;
        if existing.is_none() {
            insert_link(&*self.db, address_id, link_doctype, link_name).await?;
        }

        Ok(format!("Address linked with {} {}", link_doctype, link_name))
    }
}
