pub mod addresses;
pub mod auth;
pub mod commerce;
pub mod common;
pub mod companies;
pub mod health;
pub mod notifications;
pub mod quotations;

use crate::{
    auth::{AuthService, OtpStore},
    cache::CacheBackend,
    config::AppConfig,
    events::EventSender,
    notifications::EmailSender,
    services::{
        accounts::{AccountService, AccountSettings},
        commerce::{AddressService, CartService, CatalogService, CustomerService},
        company_links::CompanyLinkService,
        gst::GstClient,
        notifications::NotificationService,
        quotations::QuotationService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub customers: Arc<CustomerService>,
    pub addresses: Arc<AddressService>,
    pub carts: Arc<CartService>,
    pub catalog: Arc<CatalogService>,
    pub quotations: Arc<QuotationService>,
    pub notifications: Arc<NotificationService>,
    pub company_links: Arc<CompanyLinkService>,
}

/// Shared infrastructure the services are built from.
pub struct ServiceDeps {
    pub db: Arc<DatabaseConnection>,
    pub auth: Arc<AuthService>,
    pub cache: Arc<dyn CacheBackend>,
    pub mailer: Arc<dyn EmailSender>,
    pub event_sender: Arc<EventSender>,
    pub gst: GstClient,
}

impl AppServices {
    pub fn new(config: &AppConfig, deps: ServiceDeps) -> Self {
        let ServiceDeps {
            db,
            auth,
            cache,
            mailer,
            event_sender,
            gst,
        } = deps;

        let otps = OtpStore::new(cache.clone(), crate::auth::otp::OtpSettings::from_app_config(config));
        let accounts = AccountService::new(
            db.clone(),
            auth,
            otps,
            cache.clone(),
            mailer,
            event_sender.clone(),
            AccountSettings::from_app_config(config),
        );

        Self {
            accounts: Arc::new(accounts),
            customers: Arc::new(CustomerService::new(db.clone())),
            addresses: Arc::new(AddressService::new(db.clone())),
            carts: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            catalog: Arc::new(CatalogService::new(db.clone())),
            quotations: Arc::new(QuotationService::new(db.clone(), event_sender)),
            notifications: Arc::new(NotificationService::new(db.clone())),
            company_links: Arc::new(CompanyLinkService::new(db, cache, gst)),
        }
    }
}
