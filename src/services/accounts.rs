//! Storefront accounts: password and OTP login, phone-verified signup,
//! password reset and token lifecycle.
//!
//! Signup runs in three steps keyed by phone number: an OTP is issued, the
//! OTP is verified (which marks the cached entry), and only a verified entry
//! can be turned into an account. Password reset works the same way keyed by
//! the account email, ending in a short-lived reset token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{otp::IssuedOtp, user, AuthService, OtpCheck, OtpPurpose, OtpStore, TokenPair},
    cache::CacheBackend,
    config::AppConfig,
    entities::{
        commerce::customer::{CustomerType, INDIVIDUAL_GROUP},
        user_website_link::ROLE_ADMIN,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::{self, EmailSender},
    services::commerce::customer_service::{insert_customer, insert_customer_link, NewCustomer},
};

/// Domain of the address given to accounts created without an email.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "storefront.local";

const RESET_TOKEN_LENGTH: usize = 32;

pub fn placeholder_email(phone: &str) -> String {
    format!("{}@{}", phone, PLACEHOLDER_EMAIL_DOMAIN)
}

pub fn is_placeholder_email(email: &str) -> bool {
    email
        .rsplit_once('@')
        .map_or(false, |(_, domain)| domain.eq_ignore_ascii_case(PLACEHOLDER_EMAIL_DOMAIN))
}

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Splits on the first space; the remainder is the last name.
fn split_full_name(full_name: &str) -> (String, Option<String>) {
    match full_name.trim().split_once(' ') {
        Some((first, rest)) if !rest.trim().is_empty() => {
            (first.to_string(), Some(rest.trim().to_string()))
        }
        Some((first, _)) => (first.to_string(), None),
        None => (full_name.trim().to_string(), None),
    }
}

fn reset_token_key(token: &str) -> String {
    format!("password_reset_token_{}", token)
}

/// Points at the one reset token a user may currently redeem.
fn current_reset_token_key(email: &str) -> String {
    format!("password_reset_current_{}", email)
}

fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn rfc3339(timestamp: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtpDispatch {
    pub message: String,
    pub expires_in: u64,
}

impl From<IssuedOtp> for OtpDispatch {
    fn from(issued: IssuedOtp) -> Self {
        Self {
            message: "OTP generated successfully".to_string(),
            expires_in: issued.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub user_image: Option<String>,
}

impl UserProfile {
    fn from_user(user: &user::Model) -> Self {
        Self {
            email: user.email.clone(),
            phone: user.mobile_no.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            username: None,
            user_image: user.user_image.clone(),
        }
    }

    fn with_username(user: &user::Model) -> Self {
        Self {
            username: Some(user.username.clone()),
            ..Self::from_user(user)
        }
    }
}

/// Issued on login and on completed signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Answer of the token check endpoint; never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenValidation {
    pub status: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TokenValidation {
    fn invalid(message: &str) -> Self {
        Self {
            status: "invalid".to_string(),
            valid: false,
            email: None,
            issued_at: None,
            expires_at: None,
            message: Some(message.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignupVerified {
    pub message: String,
    pub verified: bool,
    pub phone: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetOtpVerified {
    pub message: String,
    pub reset_token: String,
    pub user_email: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PasswordResetDone {
    pub message: String,
    pub user_email: String,
    pub user_name: String,
}

/// OTP lifetimes per flow.
#[derive(Debug, Clone, Copy)]
pub struct AccountSettings {
    pub otp_ttl: Duration,
    pub reset_ttl: Duration,
}

impl AccountSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            otp_ttl: config.otp_ttl(),
            reset_ttl: config.reset_otp_ttl(),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    otps: OtpStore,
    cache: Arc<dyn CacheBackend>,
    mailer: Arc<dyn EmailSender>,
    event_sender: Arc<EventSender>,
    settings: AccountSettings,
}

impl AccountService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        otps: OtpStore,
        cache: Arc<dyn CacheBackend>,
        mailer: Arc<dyn EmailSender>,
        event_sender: Arc<EventSender>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            db,
            auth,
            otps,
            cache,
            mailer,
            event_sender,
            settings,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    async fn find_by_mobile(&self, phone: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::MobileNo.eq(phone))
            .one(&*self.db)
            .await?)
    }

    async fn find_enabled(
        &self,
        column: user::Column,
        value: &str,
    ) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(column.eq(value))
            .filter(user::Column::Enabled.eq(true))
            .one(&*self.db)
            .await?)
    }

    async fn send_mail(&self, email: notifications::OutgoingEmail) {
        let to = email.to.clone();
        if let Err(e) = self.mailer.send(email).await {
            error!(to = %to, error = %e, "Failed to send email");
        }
    }

    /// Password login; `username` is an email when it contains `@`, else a mobile number.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionResponse, ServiceError> {
        let username = username.trim();
        let user = if username.contains('@') {
            self.find_by_email(username).await?
        } else {
            self.find_by_mobile(username).await?
        }
        .ok_or_else(|| {
            ServiceError::Unauthorized("Invalid credentials, user not found".to_string())
        })?;

        if !user.enabled {
            return Err(ServiceError::Forbidden("User account is disabled".to_string()));
        }
        if !verify_password(password, &user.password_hash) {
            return Err(ServiceError::Unauthorized(
                "Invalid credentials, incorrect password".to_string(),
            ));
        }

        let tokens = self.auth.issue_token_pair(&user.email)?;
        info!(email = %user.email, "User logged in");
        Ok(SessionResponse {
            message: "Login successful".to_string(),
            tokens,
            user: UserProfile::from_user(&user),
        })
    }

    #[instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<AccessTokenResponse, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Invalid refresh token".to_string());

        let claims = self
            .auth
            .verify_token(refresh_token)
            .filter(|claims| claims.is_refresh())
            .ok_or_else(invalid)?;
        if self.auth.is_refresh_token_blacklisted(refresh_token).await? {
            return Err(invalid());
        }

        let user = self
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))?;
        if !user.enabled {
            return Err(ServiceError::Forbidden("User account is disabled".to_string()));
        }

        Ok(AccessTokenResponse {
            access_token: self.auth.generate_access_token(&user.email)?,
            token_type: "Bearer".to_string(),
        })
    }

    #[instrument(skip_all)]
    pub async fn validate_token(&self, token: &str) -> Result<TokenValidation, ServiceError> {
        let Some(claims) = self.auth.verify_token(token) else {
            return Ok(TokenValidation::invalid("Token is invalid or expired"));
        };

        match self.find_by_email(&claims.email).await? {
            None => Ok(TokenValidation::invalid("User not found")),
            Some(user) if !user.enabled => Ok(TokenValidation::invalid("User account is disabled")),
            Some(user) => Ok(TokenValidation {
                status: "valid".to_string(),
                valid: true,
                email: Some(user.email),
                issued_at: rfc3339(claims.iat),
                expires_at: rfc3339(claims.exp),
                message: None,
            }),
        }
    }

    pub async fn current_user(&self, email: &str) -> Result<UserProfile, ServiceError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        Ok(UserProfile::from_user(&user))
    }

    #[instrument(skip(self))]
    pub async fn send_signup_otp(
        &self,
        phone: &str,
        full_name: &str,
    ) -> Result<OtpDispatch, ServiceError> {
        if self.find_by_mobile(phone).await?.is_some() {
            return Err(ServiceError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let mut extra = BTreeMap::new();
        extra.insert("full_name".to_string(), full_name.trim().to_string());
        let issued = self
            .otps
            .issue(OtpPurpose::Signup, phone, extra, self.settings.otp_ttl)
            .await?;
        Ok(issued.into())
    }

    /// Re-issues the signup code, keeping the name captured by the first request.
    #[instrument(skip(self))]
    pub async fn resend_signup_otp(&self, phone: &str) -> Result<OtpDispatch, ServiceError> {
        if self.find_by_mobile(phone).await?.is_some() {
            return Err(ServiceError::Conflict(
                "Phone number already registered".to_string(),
            ));
        }

        let issued = self
            .otps
            .issue(OtpPurpose::Signup, phone, BTreeMap::new(), self.settings.otp_ttl)
            .await?;
        Ok(issued.into())
    }

    #[instrument(skip(self, otp))]
    pub async fn verify_signup_otp(&self, phone: &str, otp: &str) -> Result<SignupVerified, ServiceError> {
        let ttl = self.settings.otp_ttl;
        let entry = match self.otps.check(OtpPurpose::Signup, phone, otp, ttl).await? {
            OtpCheck::Missing => {
                return Err(ServiceError::ValidationError(
                    "OTP expired or invalid".to_string(),
                ))
            }
            OtpCheck::Locked => {
                return Err(ServiceError::ValidationError(
                    "Too many attempts. Request a new OTP".to_string(),
                ))
            }
            OtpCheck::Mismatch => {
                return Err(ServiceError::ValidationError("Invalid OTP".to_string()))
            }
            OtpCheck::Valid(entry) => entry,
        };

        let entry = self
            .otps
            .mark_verified(OtpPurpose::Signup, phone, entry, ttl)
            .await?;

        Ok(SignupVerified {
            message: "OTP verified successfully".to_string(),
            verified: true,
            phone: phone.to_string(),
            full_name: entry.extra("full_name").unwrap_or_default().to_string(),
        })
    }

    /// Creates the account for a verified phone number.
    #[instrument(skip(self, password))]
    pub async fn complete_signup(
        &self,
        phone: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<SessionResponse, ServiceError> {
        let entry = self
            .otps
            .load(OtpPurpose::Signup, phone)
            .await?
            .filter(|entry| entry.verified)
            .ok_or_else(|| {
                ServiceError::ValidationError("Phone verification required".to_string())
            })?;
        let full_name = entry.extra("full_name").unwrap_or_default().trim().to_string();

        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => {
                if !email.contains('@') || !email.contains('.') {
                    return Err(ServiceError::ValidationError(
                        "Please enter a valid email address".to_string(),
                    ));
                }
                if self.find_by_email(email).await?.is_some() {
                    return Err(ServiceError::Conflict(
                        "Email already registered. Please use a different email or login."
                            .to_string(),
                    ));
                }
                email.to_string()
            }
            None => placeholder_email(phone),
        };

        if self.find_by_mobile(phone).await?.is_some() {
            return Err(ServiceError::Conflict(
                "Phone number already registered. Please login instead.".to_string(),
            ));
        }

        let (first_name, last_name) = split_full_name(&full_name);
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.clone()),
            username: Set(format!("user_{}", phone)),
            mobile_no: Set(Some(phone.to_string())),
            first_name: Set(first_name.clone()),
            last_name: Set(last_name),
            password_hash: Set(password_hash),
            user_image: Set(None),
            enabled: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        info!(email = %user.email, "User created");

        if let Err(e) = self.create_signup_customer(&user, &full_name, phone).await {
            warn!(email = %user.email, error = %e, "Failed to create customer for new user");
        }

        let tokens = self.auth.issue_token_pair(&user.email)?;

        if !is_placeholder_email(&user.email) {
            self.send_mail(notifications::welcome_email(&user.email, &first_name, phone))
                .await;
        }

        self.otps.remove(OtpPurpose::Signup, phone).await?;
        self.event_sender
            .send_or_log(Event::UserRegistered {
                email: user.email.clone(),
            })
            .await;

        Ok(SessionResponse {
            message: "Account created successfully".to_string(),
            tokens,
            user: UserProfile::with_username(&user),
        })
    }

    /// Individual customer owned by the new user, plus an admin link to it.
    async fn create_signup_customer(
        &self,
        user: &user::Model,
        full_name: &str,
        phone: &str,
    ) -> Result<(), ServiceError> {
        let customer_name = if full_name.is_empty() { phone } else { full_name };
        let mut customer = NewCustomer::new(customer_name, CustomerType::Individual, INDIVIDUAL_GROUP);
        customer.mobile_no = Some(phone.to_string());
        customer.email_id = Some(user.email.clone()).filter(|e| !is_placeholder_email(e));
        customer.user_id = Some(user.id);

        let txn = self.db.begin().await?;
        let customer = insert_customer(&txn, customer).await?;
        insert_customer_link(&txn, &user.email, customer.id, ROLE_ADMIN, true, false).await?;
        txn.commit().await?;

        info!(customer_id = %customer.id, email = %user.email, "Customer created for new user");
        Ok(())
    }

    async fn issue_reset_otp(&self, user: &user::Model) -> Result<OtpDispatch, ServiceError> {
        let mut extra = BTreeMap::new();
        extra.insert("user_email".to_string(), user.email.clone());
        extra.insert("name".to_string(), user.first_name.clone());

        let ttl = self.settings.reset_ttl;
        let issued = self
            .otps
            .issue(OtpPurpose::Reset, &user.email, extra, ttl)
            .await?;

        if !is_placeholder_email(&user.email) {
            self.send_mail(notifications::password_reset_otp_email(
                &user.email,
                &user.full_name(),
                &issued.code,
                ttl.as_secs() / 60,
            ))
            .await;
        }

        Ok(issued.into())
    }

    #[instrument(skip(self))]
    pub async fn forgot_password_request(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<OtpDispatch, ServiceError> {
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());
        let email = email.map(str::trim).filter(|e| !e.is_empty());

        let user = match (phone, email) {
            (Some(phone), _) => self
                .find_enabled(user::Column::MobileNo, phone)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound("No account found with this phone number".to_string())
                })?,
            (None, Some(email)) => {
                if !email.contains('@') {
                    return Err(ServiceError::ValidationError(
                        "Please enter a valid email address".to_string(),
                    ));
                }
                self.find_enabled(user::Column::Email, email)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(
                            "No account found with this email address".to_string(),
                        )
                    })?
            }
            (None, None) => {
                return Err(ServiceError::ValidationError(
                    "Either phone or email must be provided".to_string(),
                ))
            }
        };

        self.issue_reset_otp(&user).await
    }

    #[instrument(skip(self))]
    pub async fn resend_reset_otp(&self, identifier: &str) -> Result<OtpDispatch, ServiceError> {
        let identifier = identifier.trim();
        let column = if identifier.contains('@') {
            user::Column::Email
        } else {
            user::Column::MobileNo
        };
        let user = self
            .find_enabled(column, identifier)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        self.issue_reset_otp(&user).await
    }

    /// Trades a correct reset OTP for a one-time reset token.
    #[instrument(skip(self, otp))]
    pub async fn verify_reset_otp(
        &self,
        identifier: &str,
        otp: &str,
    ) -> Result<ResetOtpVerified, ServiceError> {
        let identifier = identifier.trim();
        let column = if crate::auth::validators::looks_like_phone(identifier) {
            user::Column::MobileNo
        } else {
            user::Column::Email
        };
        let user = self
            .find_enabled(column, identifier)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        let ttl = self.settings.reset_ttl;
        let entry = match self.otps.check(OtpPurpose::Reset, &user.email, otp, ttl).await? {
            OtpCheck::Missing => {
                return Err(ServiceError::ValidationError(
                    "Reset request has expired. Please request again.".to_string(),
                ))
            }
            OtpCheck::Locked => {
                return Err(ServiceError::ValidationError(
                    "Too many failed attempts. Please request a new OTP.".to_string(),
                ))
            }
            OtpCheck::Mismatch => {
                return Err(ServiceError::ValidationError("Invalid OTP".to_string()))
            }
            OtpCheck::Valid(entry) => entry,
        };
        self.otps
            .mark_verified(OtpPurpose::Reset, &user.email, entry, ttl)
            .await?;

        // A fresh token replaces whatever an earlier verification handed out.
        let current_key = current_reset_token_key(&user.email);
        if let Some(previous) = self.cache.get(&current_key).await? {
            self.cache.delete(&reset_token_key(&previous)).await?;
        }
        let reset_token = generate_reset_token();
        self.cache
            .set(&reset_token_key(&reset_token), &user.email, Some(ttl))
            .await?;
        self.cache.set(&current_key, &reset_token, Some(ttl)).await?;

        Ok(ResetOtpVerified {
            message: "OTP verified successfully".to_string(),
            reset_token,
            user_email: user.email,
            expires_in: ttl.as_secs(),
        })
    }

    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<PasswordResetDone, ServiceError> {
        if new_password != confirm_password {
            return Err(ServiceError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }

        let invalid = || ServiceError::ValidationError("Invalid or expired reset token".to_string());
        let reset_token = reset_token.trim();
        let key = reset_token_key(reset_token);
        let email = self.cache.get(&key).await?.ok_or_else(invalid)?;
        let current_key = current_reset_token_key(&email);
        if self.cache.get(&current_key).await?.as_deref() != Some(reset_token) {
            self.cache.delete(&key).await?;
            return Err(invalid());
        }
        let user = self.find_by_email(&email).await?.ok_or_else(invalid)?;

        let mut model: user::ActiveModel = user.clone().into();
        model.password_hash = Set(hash_password(new_password)?);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;

        self.cache.delete(&key).await?;
        self.cache.delete(&current_key).await?;
        self.otps.remove(OtpPurpose::Reset, &user.email).await?;
        info!(email = %user.email, "Password reset");

        if !is_placeholder_email(&user.email) {
            self.send_mail(notifications::password_reset_success_email(
                &user.email,
                &user.first_name,
            ))
            .await;
        }
        self.event_sender
            .send_or_log(Event::PasswordReset {
                email: user.email.clone(),
            })
            .await;

        Ok(PasswordResetDone {
            message: "Password reset successfully".to_string(),
            user_email: user.email,
            user_name: user.first_name,
        })
    }

    #[instrument(skip(self))]
    pub async fn send_login_otp(&self, phone: &str) -> Result<OtpDispatch, ServiceError> {
        let user = self
            .find_enabled(user::Column::MobileNo, phone)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        let mut extra = BTreeMap::new();
        extra.insert("user_email".to_string(), user.email);
        let issued = self
            .otps
            .issue(OtpPurpose::Login, phone, extra, self.settings.otp_ttl)
            .await?;
        Ok(issued.into())
    }

    #[instrument(skip(self, otp))]
    pub async fn verify_login_otp(&self, phone: &str, otp: &str) -> Result<TokenPair, ServiceError> {
        let ttl = self.settings.otp_ttl;
        let entry = match self.otps.check(OtpPurpose::Login, phone, otp, ttl).await? {
            OtpCheck::Missing => {
                return Err(ServiceError::ValidationError("OTP expired".to_string()))
            }
            OtpCheck::Locked => {
                return Err(ServiceError::ValidationError(
                    "Too many attempts. Request a new OTP".to_string(),
                ))
            }
            OtpCheck::Mismatch => {
                return Err(ServiceError::ValidationError("Invalid OTP".to_string()))
            }
            OtpCheck::Valid(entry) => entry,
        };

        let email = entry
            .extra("user_email")
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;
        let user = self
            .find_enabled(user::Column::Email, email)
            .await?
            .ok_or_else(|| ServiceError::Forbidden("Account not found or disabled".to_string()))?;

        self.otps.remove(OtpPurpose::Login, phone).await?;
        info!(email = %user.email, "User logged in with OTP");
        Ok(self.auth.issue_token_pair(&user.email)?)
    }

    /// Blacklists the caller's refresh token.
    #[instrument(skip(self, refresh_token))]
    pub async fn logout(&self, caller_email: &str, refresh_token: &str) -> Result<(), ServiceError> {
        let claims = self
            .auth
            .verify_token(refresh_token)
            .filter(|claims| claims.is_refresh() && claims.email == caller_email)
            .ok_or_else(|| ServiceError::Unauthorized("Invalid refresh token".to_string()))?;

        self.auth.blacklist_refresh_token(refresh_token).await?;
        info!(email = %claims.email, "User logged out");
        Ok(())
    }
}
