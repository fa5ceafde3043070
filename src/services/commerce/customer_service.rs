use crate::{
    auth::user,
    entities::{
        commerce::{
            customer::{self, CustomerType, DEFAULT_TERRITORY},
            Customer, CustomerModel,
        },
        user_website_link::{self, CUSTOMER_DOCUMENT},
        UserWebsiteLink,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Fields for a new customer row.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub customer_name: String,
    pub customer_type: CustomerType,
    pub customer_group: String,
    pub mobile_no: Option<String>,
    pub email_id: Option<String>,
    pub tax_id: Option<String>,
    pub user_id: Option<Uuid>,
}

impl NewCustomer {
    pub fn new(customer_name: impl Into<String>, customer_type: CustomerType, group: &str) -> Self {
        Self {
            customer_name: customer_name.into(),
            customer_type,
            customer_group: group.to_string(),
            mobile_no: None,
            email_id: None,
            tax_id: None,
            user_id: None,
        }
    }
}

/// Inserts a customer on `conn`, which may be a transaction.
pub async fn insert_customer<C: ConnectionTrait>(
    conn: &C,
    input: NewCustomer,
) -> Result<CustomerModel, DbErr> {
    let now = Utc::now();
    customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_name: Set(input.customer_name),
        customer_type: Set(input.customer_type),
        customer_group: Set(input.customer_group),
        territory: Set(DEFAULT_TERRITORY.to_string()),
        mobile_no: Set(input.mobile_no),
        email_id: Set(input.email_id),
        tax_id: Set(input.tax_id),
        user_id: Set(input.user_id),
        disabled: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Grants `user_email` access to a customer.
pub async fn insert_customer_link<C: ConnectionTrait>(
    conn: &C,
    user_email: &str,
    customer_id: Uuid,
    role_profile: &str,
    is_primary: bool,
    is_disable: bool,
) -> Result<user_website_link::Model, DbErr> {
    let now = Utc::now();
    user_website_link::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_email: Set(user_email.to_string()),
        link_document_type: Set(CUSTOMER_DOCUMENT.to_string()),
        link_name: Set(customer_id.to_string()),
        role_profile: Set(role_profile.to_string()),
        is_primary: Set(is_primary),
        is_disable: Set(is_disable),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Customer lookup and the access rules tying customers to storefront users.
///
/// A user may act on a customer when the customer row points at the user, or
/// when an enabled website link grants access to it.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    /// Ids of every customer `email` may act on.
    #[instrument(skip(self))]
    pub async fn accessible_customer_ids(&self, email: &str) -> Result<BTreeSet<Uuid>, ServiceError> {
        let mut ids = BTreeSet::new();

        if let Some(user) = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
        {
            let owned = Customer::find()
                .filter(customer::Column::UserId.eq(user.id))
                .all(&*self.db)
                .await?;
            ids.extend(owned.into_iter().map(|c| c.id));
        }

        let links = UserWebsiteLink::find()
            .filter(user_website_link::Column::UserEmail.eq(email))
            .filter(user_website_link::Column::LinkDocumentType.eq(CUSTOMER_DOCUMENT))
            .filter(user_website_link::Column::IsDisable.eq(false))
            .all(&*self.db)
            .await?;
        ids.extend(
            links
                .iter()
                .filter_map(|link| Uuid::parse_str(&link.link_name).ok()),
        );

        Ok(ids)
    }

    /// Fails with 403 unless `email` may act on `customer_id`.
    pub async fn ensure_access(&self, customer_id: Uuid, email: &str) -> Result<(), ServiceError> {
        if self.accessible_customer_ids(email).await?.contains(&customer_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "You do not have access to this customer".to_string(),
            ))
        }
    }

    /// Emails of the users behind a customer, owner first.
    #[instrument(skip(self))]
    pub async fn user_emails_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<String>, ServiceError> {
        let mut emails = Vec::new();

        let owner = Customer::find_by_id(customer_id)
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await?;
        if let Some((_, Some(owner))) = owner {
            emails.push(owner.email);
        }

        let links = UserWebsiteLink::find()
            .filter(user_website_link::Column::LinkDocumentType.eq(CUSTOMER_DOCUMENT))
            .filter(user_website_link::Column::LinkName.eq(customer_id.to_string()))
            .filter(user_website_link::Column::IsDisable.eq(false))
            .all(&*self.db)
            .await?;
        for link in links {
            if !emails.contains(&link.user_email) {
                emails.push(link.user_email);
            }
        }

        Ok(emails)
    }
}
