#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use storefront_api::{
    auth::user,
    cache::InMemoryCache,
    config::AppConfig,
    db,
    entities::{
        catalog::{item, item_price, website_item},
        commerce::{customer::CustomerType, shipping_process, warehouse},
        sales::company,
    },
    events::{self, EventHandler},
    metrics::MetricsEventHandler,
    notifications::{EmailError, EmailSender, OutgoingEmail},
    services::{
        accounts::hash_password,
        commerce::{
            customer_service::{insert_customer, insert_customer_link},
            NewCustomer,
        },
        notifications::NotificationEventHandler,
    },
    AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const FIXED_OTP: &str = "123456";
pub const PASSWORD: &str = "Str0ng!Pass";
pub const COMPANY: &str = "Storefront Traders";
pub const SHIPPING_PROCESS: &str = "Standard Delivery";

/// Captures outgoing mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(email);
        Ok(())
    }
}

/// A seeded storefront account: the user and the customer it owns.
pub struct Account {
    pub user_id: Uuid,
    pub customer_id: Uuid,
    pub email: String,
    pub mobile: String,
    pub token: String,
}

/// Application router over a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    _event_task: tokio::task::JoinHandle<()>,
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        None,
        "test_secret_key_for_storefront_tests_only_32chars".to_string(),
        3600,
        86_400,
        "127.0.0.1".to_string(),
        0,
        "test".to_string(),
    );
    // Every pooled connection would get its own in-memory database.
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg.otp_fixed_code = Some(FIXED_OTP.to_string());
    cfg
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let mailer = Arc::new(RecordingMailer::default());
        let (event_sender, event_rx) = events::channel();
        let state = AppState::new(
            cfg,
            db.clone(),
            Arc::new(InMemoryCache::new()),
            mailer.clone(),
            event_sender,
        )
        .expect("failed to build application state");

        let handlers: Vec<Arc<dyn EventHandler>> = vec![
            Arc::new(NotificationEventHandler::new(db)),
            Arc::new(MetricsEventHandler::new(state.metrics.clone())),
        ];
        let event_task = tokio::spawn(events::process_events(event_rx, handlers));
        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            mailer,
            _event_task: event_task,
        }
    }

    /// Sends a request, passing `token` in the `Token` header.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("token", tok);
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };
        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Like [`TestApp::request`] but decodes the JSON body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        read_json(response).await
    }

    pub async fn seed_company(&self, gst_rate: Decimal) {
        company::ActiveModel {
            name: Set(COMPANY.to_string()),
            company_name: Set(format!("{} Pvt Ltd", COMPANY)),
            tax_id: Set(Some("27AAACS1234F1Z5".to_string())),
            default_currency: Set("INR".to_string()),
            email: Set(None),
            phone_no: Set(None),
            gst_rate: Set(gst_rate),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert company");
    }

    /// Shipping process and warehouse needed before a cart can be created.
    pub async fn seed_logistics(&self) {
        let now = Utc::now();
        shipping_process::ActiveModel {
            name: Set(SHIPPING_PROCESS.to_string()),
            shipping_process: Set(SHIPPING_PROCESS.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert shipping process");

        warehouse::ActiveModel {
            name: Set("Stores - ST".to_string()),
            warehouse_name: Set("Stores".to_string()),
            is_available: Set(true),
            created_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert warehouse");
    }

    /// Item master row, its website listing and a selling price.
    pub async fn seed_item(&self, code: &str, name: &str, price: Decimal, published: bool) {
        let now = Utc::now();
        item::ActiveModel {
            item_code: Set(code.to_string()),
            item_name: Set(name.to_string()),
            description: Set(None),
            image: Set(Some(format!("/files/{}.jpg", code.to_lowercase()))),
            item_group: Set(Some("Tools".to_string())),
            stock_uom: Set(Some("Nos".to_string())),
            has_variants: Set(false),
            variant_of: Set(None),
            disabled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert item");

        website_item::ActiveModel {
            item_code: Set(code.to_string()),
            web_item_name: Set(name.to_string()),
            item_group: Set(Some("Tools".to_string())),
            stock_uom: Set(Some("Nos".to_string())),
            published: Set(published),
            website_image: Set(None),
            short_description: Set(None),
            web_long_description: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert website item");

        item_price::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set(code.to_string()),
            price_list: Set("Standard Selling".to_string()),
            price_list_rate: Set(price),
            selling: Set(true),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert item price");
    }

    /// User with the default password, owning one individual customer.
    pub async fn create_user(&self, email: &str, mobile: &str) -> (Uuid, Uuid) {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(user_id),
            email: Set(email.to_string()),
            username: Set(email.to_string()),
            mobile_no: Set(Some(mobile.to_string())),
            first_name: Set("Test".to_string()),
            last_name: Set(Some("Buyer".to_string())),
            password_hash: Set(hash_password(PASSWORD).expect("hash password")),
            user_image: Set(None),
            enabled: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("insert user");

        let mut customer = NewCustomer::new(
            format!("Customer {}", mobile),
            CustomerType::Individual,
            "Individual",
        );
        customer.mobile_no = Some(mobile.to_string());
        customer.email_id = Some(email.to_string());
        customer.user_id = Some(user_id);
        let customer = insert_customer(&*self.state.db, customer)
            .await
            .expect("insert customer");
        insert_customer_link(&*self.state.db, email, customer.id, "Admin", true, false)
            .await
            .expect("insert customer link");

        (user_id, customer.id)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/v1/auth/login",
                Some(json!({"username": username, "password": password})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"]
            .as_str()
            .expect("access token in login response")
            .to_string()
    }

    /// Creates a user plus customer and logs in.
    pub async fn account(&self, email: &str, mobile: &str) -> Account {
        let (user_id, customer_id) = self.create_user(email, mobile).await;
        let token = self.login(email, PASSWORD).await;
        Account {
            user_id,
            customer_id,
            email: email.to_string(),
            mobile: mobile.to_string(),
            token,
        }
    }

    /// Polls the unread count until it reaches `expected`; events are applied asynchronously.
    pub async fn wait_for_unread(&self, token: &str, expected: u64) -> u64 {
        let mut last = 0;
        for _ in 0..100 {
            let (_, body) = self
                .json(Method::GET, "/api/v1/notifications/unread-count", None, Some(token))
                .await;
            last = body["unread_count"].as_u64().unwrap_or(0);
            if last >= expected {
                return last;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        last
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, value)
}
