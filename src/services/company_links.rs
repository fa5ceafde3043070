use crate::{
    cache::CacheBackend,
    entities::{
        commerce::{
            customer::{self, CustomerType, COMMERCIAL_GROUP, INDIVIDUAL_GROUP},
            Customer,
        },
        user_website_link::{self, ROLE_ADMIN, ROLE_USER},
        UserWebsiteLink,
    },
    errors::ServiceError,
    services::{
        commerce::{
            address_service::{insert_customer_address, AddressInput},
            customer_service::{insert_customer, insert_customer_link, NewCustomer},
        },
        gst::GstClient,
    },
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

const PENDING_GST_MESSAGE: &str =
    "Your company already exists. An access request has been sent to your Company Admin.";
const PENDING_NON_GST_MESSAGE: &str =
    "Your company already exists. Please contact your Company Admin to approve your access.";

fn active_company_key(email: &str) -> String {
    format!("active_company_{}", email)
}

/// A company or customer the user may act for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyLink {
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub role: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OnboardingCheck {
    fn pending(message: &str) -> Self {
        Self {
            status: "pending".to_string(),
            message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingCreated {
    pub status: String,
    pub customer: Uuid,
}

/// Details for a business registering without a GSTIN.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NonGstCompanyInput {
    #[validate(length(min = 2, max = 140, message = "company_name is required"))]
    pub company_name: String,
    #[validate(custom = "crate::auth::validators::validate_phone")]
    pub mobile_no: String,
    #[validate(length(min = 1, max = 240, message = "address_line1 is required"))]
    pub address_line1: String,
    #[validate(length(min = 1, max = 140, message = "city is required"))]
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// User to company links, the active company selection and business onboarding.
#[derive(Clone)]
pub struct CompanyLinkService {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn CacheBackend>,
    gst: GstClient,
}

impl CompanyLinkService {
    pub fn new(db: Arc<DatabaseConnection>, cache: Arc<dyn CacheBackend>, gst: GstClient) -> Self {
        Self { db, cache, gst }
    }

    /// Enabled links, primary first then most recently modified.
    #[instrument(skip(self))]
    pub async fn get_user_companies(&self, email: &str) -> Result<Vec<CompanyLink>, ServiceError> {
        let links = UserWebsiteLink::find()
            .filter(user_website_link::Column::UserEmail.eq(email))
            .filter(user_website_link::Column::IsDisable.eq(false))
            .order_by_desc(user_website_link::Column::IsPrimary)
            .order_by_desc(user_website_link::Column::UpdatedAt)
            .all(&*self.db)
            .await?;

        Ok(links
            .into_iter()
            .map(|l| CompanyLink {
                name: l.link_name,
                link_type: l.link_document_type,
                role: l.role_profile,
                is_primary: l.is_primary,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn set_active_company(&self, email: &str, company: &str) -> Result<String, ServiceError> {
        let link = UserWebsiteLink::find()
            .filter(user_website_link::Column::UserEmail.eq(email))
            .filter(user_website_link::Column::LinkName.eq(company))
            .filter(user_website_link::Column::IsDisable.eq(false))
            .one(&*self.db)
            .await?;
        if link.is_none() {
            return Err(ServiceError::Forbidden(
                "You do not have access to this company".to_string(),
            ));
        }

        self.cache
            .set(&active_company_key(email), company, None)
            .await?;
        Ok(company.to_string())
    }

    pub async fn active_company(&self, email: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.cache.get(&active_company_key(email)).await?)
    }

    /// Records a disabled `User` link for staff approval, once per user and customer.
    async fn request_access(&self, email: &str, customer_id: Uuid) -> Result<(), ServiceError> {
        let existing = UserWebsiteLink::find()
            .filter(user_website_link::Column::UserEmail.eq(email))
            .filter(user_website_link::Column::LinkName.eq(customer_id.to_string()))
            .one(&*self.db)
            .await?;
        if existing.is_none() {
            insert_customer_link(&*self.db, email, customer_id, ROLE_USER, false, true).await?;
            info!(%customer_id, user = %email, "Access request recorded");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn check_gst_customer(&self, email: &str, gst_no: &str) -> Result<OnboardingCheck, ServiceError> {
        let gst_no = gst_no.trim();
        if gst_no.is_empty() {
            return Err(ServiceError::ValidationError("gst_no is required".to_string()));
        }

        let existing = Customer::find()
            .filter(customer::Column::TaxId.eq(gst_no))
            .one(&*self.db)
            .await?;

        match existing {
            Some(customer) => {
                self.request_access(email, customer.id).await?;
                Ok(OnboardingCheck::pending(PENDING_GST_MESSAGE))
            }
            None => Ok(OnboardingCheck {
                status: "new_gst".to_string(),
                message: Some("GST not found. Proceed to onboarding.".to_string()),
            }),
        }
    }

    /// Creates a company customer from the GST registry and makes the caller its admin.
    #[instrument(skip(self))]
    pub async fn create_gst_customer(&self, email: &str, gst_no: &str) -> Result<OnboardingCreated, ServiceError> {
        let gst_no = gst_no.trim();
        if gst_no.is_empty() {
            return Err(ServiceError::ValidationError("gst_no is required".to_string()));
        }
        if Customer::find()
            .filter(customer::Column::TaxId.eq(gst_no))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A customer with this GST number already exists".to_string(),
            ));
        }

        let details = self.gst.fetch_details(gst_no).await?;

        let txn = self.db.begin().await?;
        let mut new_customer =
            NewCustomer::new(details.legal_name.clone(), CustomerType::Company, COMMERCIAL_GROUP);
        new_customer.tax_id = Some(gst_no.to_string());
        let created = insert_customer(&txn, new_customer).await?;

        if let Some(address) = details.address.clone().filter(|a| !a.trim().is_empty()) {
            insert_customer_address(
                &txn,
                created.id,
                AddressInput {
                    address_title: details.legal_name.clone(),
                    address_line1: address,
                    city: details.state.clone().unwrap_or_default(),
                    state: details.state.clone(),
                    is_primary_address: true,
                    is_shipping_address: true,
                    ..Default::default()
                },
            )
            .await?;
        }

        insert_customer_link(&txn, email, created.id, ROLE_ADMIN, true, false).await?;
        txn.commit().await?;

        info!(customer = %created.id, gstin = %gst_no, "GST customer onboarded");
        Ok(OnboardingCreated {
            status: "success".to_string(),
            customer: created.id,
        })
    }

    #[instrument(skip(self))]
    pub async fn check_non_gst_customer(
        &self,
        email: &str,
        mobile_no: &str,
    ) -> Result<OnboardingCheck, ServiceError> {
        crate::auth::validators::validate_phone(mobile_no).map_err(|e| {
            ServiceError::ValidationError(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid mobile number".to_string()),
            )
        })?;

        let existing = Customer::find()
            .filter(customer::Column::MobileNo.eq(mobile_no))
            .filter(customer::Column::TaxId.is_null())
            .one(&*self.db)
            .await?;

        match existing {
            Some(customer) => {
                self.request_access(email, customer.id).await?;
                Ok(OnboardingCheck::pending(PENDING_NON_GST_MESSAGE))
            }
            None => Ok(OnboardingCheck {
                status: "new_non_gst".to_string(),
                message: None,
            }),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_non_gst_customer(
        &self,
        email: &str,
        input: NonGstCompanyInput,
    ) -> Result<OnboardingCreated, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let mut new_customer = NewCustomer::new(
            input.company_name.trim(),
            CustomerType::Individual,
            INDIVIDUAL_GROUP,
        );
        new_customer.mobile_no = Some(input.mobile_no.clone());
        let created = insert_customer(&txn, new_customer).await?;

        insert_customer_address(
            &txn,
            created.id,
            AddressInput {
                address_title: input.company_name.trim().to_string(),
                address_line1: input.address_line1,
                city: input.city,
                state: input.state,
                pincode: input.pincode,
                phone: Some(input.mobile_no),
                is_primary_address: true,
                is_shipping_address: true,
                ..Default::default()
            },
        )
        .await?;

        insert_customer_link(&txn, email, created.id, ROLE_ADMIN, true, false).await?;
        txn.commit().await?;

        info!(customer = %created.id, "Non-GST customer onboarded");
        Ok(OnboardingCreated {
            status: "success".to_string(),
            customer: created.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_company_is_keyed_by_email() {
        assert_eq!(
            active_company_key("asha@example.com"),
            "active_company_asha@example.com"
        );
    }

    #[test]
    fn non_gst_input_requires_ten_digit_mobile() {
        let input = NonGstCompanyInput {
            company_name: "Asha Electricals".into(),
            mobile_no: "98765".into(),
            address_line1: "4 Market Lane".into(),
            city: "Nashik".into(),
            state: None,
            pincode: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("mobile_no"));
    }

    #[test]
    fn company_link_serializes_type_field() {
        let link = CompanyLink {
            name: "c-1".into(),
            link_type: "Customer".into(),
            role: "Admin".into(),
            is_primary: true,
        };
        let value = serde_json::to_value(link).unwrap();
        assert_eq!(value["type"], "Customer");
        assert_eq!(value["is_primary"], true);
    }
}
