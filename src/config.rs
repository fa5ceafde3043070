use config::{Config, ConfigError, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CACHE_BACKEND: &str = "memory";
const DEFAULT_JWT_ALGORITHM: &str = "HS256";
const DEFAULT_OTP_LENGTH: usize = 6;
const DEFAULT_OTP_EXPIRY_MINUTES: u64 = 10;
const DEFAULT_RESET_OTP_EXPIRY_MINUTES: u64 = 15;
const DEFAULT_OTP_RESEND_LIMIT: u32 = 5;
const DEFAULT_OTP_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_GST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EMAIL_FROM: &str = "Storefront <no-reply@storefront.local>";
pub(crate) const DEV_DEFAULT_JWT_SECRET: &str =
    "storefront_development_secret_do_not_use_outside_development_0123456789";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL, required when `cache_backend` is `redis`
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Where OTP entries, reset tokens and the refresh blacklist live: "memory" or "redis"
    #[serde(default = "default_cache_backend")]
    #[validate(custom = "validate_cache_backend")]
    pub cache_backend: String,

    /// HMAC secret for access and refresh tokens
    #[validate(length(min = 32), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Signing algorithm name (HS256, HS384 or HS512)
    #[serde(default = "default_jwt_algorithm")]
    #[validate(custom = "validate_jwt_algorithm")]
    pub jwt_algorithm: String,

    /// Access token lifetime in seconds
    pub jwt_expiration: usize,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiration: usize,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Number of digits in generated one-time passwords
    #[serde(default = "default_otp_length")]
    #[validate(range(min = 4, max = 9))]
    pub otp_length: usize,

    /// Lifetime of signup and login OTPs
    #[serde(default = "default_otp_expiry_minutes")]
    pub otp_expiry_minutes: u64,

    /// Lifetime of password reset OTPs and reset tokens
    #[serde(default = "default_reset_otp_expiry_minutes")]
    pub reset_otp_expiry_minutes: u64,

    /// Resends allowed while an OTP entry is alive
    #[serde(default = "default_otp_resend_limit")]
    pub otp_resend_limit_per_hour: u32,

    /// Wrong guesses allowed before an OTP entry is locked
    #[serde(default = "default_otp_max_attempts")]
    #[validate(range(min = 1))]
    pub otp_max_attempts: u32,

    /// Fixed OTP code used instead of random digits outside production
    #[serde(default)]
    pub otp_fixed_code: Option<String>,

    /// Base URL of the GST registry lookup API
    #[serde(default)]
    pub gst_api_url: Option<String>,

    /// Bearer key for the GST registry lookup API
    #[serde(default)]
    pub gst_api_key: Option<String>,

    #[serde(default = "default_gst_timeout_secs")]
    pub gst_api_timeout_secs: u64,

    /// SMTP relay; when unset outgoing mail is only logged
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_email_from")]
    pub email_from: String,
}

impl AppConfig {
    /// Creates a new configuration
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database_url: String,
        redis_url: Option<String>,
        jwt_secret: String,
        jwt_expiration: usize,
        refresh_token_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url,
            cache_backend: default_cache_backend(),
            jwt_secret,
            jwt_algorithm: default_jwt_algorithm(),
            jwt_expiration,
            refresh_token_expiration,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            otp_length: default_otp_length(),
            otp_expiry_minutes: default_otp_expiry_minutes(),
            reset_otp_expiry_minutes: default_reset_otp_expiry_minutes(),
            otp_resend_limit_per_hour: default_otp_resend_limit(),
            otp_max_attempts: default_otp_max_attempts(),
            otp_fixed_code: None,
            gst_api_url: None,
            gst_api_key: None,
            gst_api_timeout_secs: default_gst_timeout_secs(),
            smtp_host: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            email_from: default_email_from(),
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Parsed signing algorithm; falls back to HS256 for unparseable names
    pub fn jwt_algorithm(&self) -> Algorithm {
        Algorithm::from_str(self.jwt_algorithm.trim()).unwrap_or(Algorithm::HS256)
    }

    /// The fixed OTP code, ignored in production
    pub fn effective_otp_fixed_code(&self) -> Option<&str> {
        if self.is_production() {
            return None;
        }
        self.otp_fixed_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_expiry_minutes * 60)
    }

    pub fn reset_otp_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_otp_expiry_minutes * 60)
    }

    pub fn uses_redis_cache(&self) -> bool {
        self.cache_backend.eq_ignore_ascii_case("redis")
    }

    pub(crate) fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development. Set APP__JWT_SECRET to a unique, secure value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if self.is_production() && self.otp_fixed_code.is_some() {
            let mut err = ValidationError::new("otp_fixed_code_in_production");
            err.message = Some("A fixed OTP code cannot be configured in production".into());
            errors.add("otp_fixed_code", err);
        }

        if self.uses_redis_cache() && self.redis_url.is_none() {
            let mut err = ValidationError::new("redis_url_required");
            err.message = Some("Set APP__REDIS_URL when cache_backend is redis".into());
            errors.add("redis_url", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cache_backend() -> String {
    DEFAULT_CACHE_BACKEND.to_string()
}

fn default_jwt_algorithm() -> String {
    DEFAULT_JWT_ALGORITHM.to_string()
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_otp_length() -> usize {
    DEFAULT_OTP_LENGTH
}
fn default_otp_expiry_minutes() -> u64 {
    DEFAULT_OTP_EXPIRY_MINUTES
}
fn default_reset_otp_expiry_minutes() -> u64 {
    DEFAULT_RESET_OTP_EXPIRY_MINUTES
}
fn default_otp_resend_limit() -> u32 {
    DEFAULT_OTP_RESEND_LIMIT
}
fn default_otp_max_attempts() -> u32 {
    DEFAULT_OTP_MAX_ATTEMPTS
}

fn default_gst_timeout_secs() -> u64 {
    DEFAULT_GST_TIMEOUT_SECS
}

fn default_email_from() -> String {
    DEFAULT_EMAIL_FROM.to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_cache_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "memory" | "redis" => Ok(()),
        _ => {
            let mut err = ValidationError::new("cache_backend");
            err.message = Some("Must be one of: memory, redis".into());
            Err(err)
        }
    }
}

fn validate_jwt_algorithm(value: &str) -> Result<(), ValidationError> {
    match Algorithm::from_str(value.trim()) {
        Ok(Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(()),
        _ => {
            let mut err = ValidationError::new("jwt_algorithm");
            err.message = Some("Must be one of: HS256, HS384, HS512".into());
            Err(err)
        }
    }
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    const DISALLOWED: [&str; 3] = [
        "your-secret-key-change-in-production",
        "your-secret-key",
        "default-secret-key",
    ];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be overridden with a secure random value".into());
        return Err(err);
    }

    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some("JWT secret cannot be a repeated character sequence".into());
            return Err(err);
        }
    }

    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message =
            Some("JWT secret must have at least 10 unique characters for adequate entropy".into());
        return Err(err);
    }

    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same layering as [`load_config`] with the profile files read from `config_dir`.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("jwt_expiration", 3600)?
        .set_default("refresh_token_expiration", 604_800)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    // Only development gets a bundled secret; every other environment must set one.
    if run_env.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder = builder.set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?;
    }

    let config = builder
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET environment variable with a secure random string.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            None,
            "a_long_and_varied_test_secret_for_signing_tokens_0987654321".into(),
            3600,
            86_400,
            "127.0.0.1".into(),
            8080,
            "production".into(),
        )
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_accepts_configured_origins() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://shop.example.com".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn dev_secret_rejected_outside_development() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("jwt_secret"));
    }

    #[test]
    fn fixed_otp_is_ignored_and_rejected_in_production() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.otp_fixed_code = Some("123456".into());
        assert_eq!(cfg.effective_otp_fixed_code(), None);
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.environment = "development".into();
        assert_eq!(cfg.effective_otp_fixed_code(), Some("123456"));
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn redis_backend_requires_url() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        cfg.cache_backend = "redis".into();
        assert!(cfg.validate_additional_constraints().is_err());
        cfg.redis_url = Some("redis://127.0.0.1:6379".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn only_hmac_algorithms_are_accepted() {
        assert!(validate_jwt_algorithm("HS384").is_ok());
        assert!(validate_jwt_algorithm("RS256").is_err());
        assert!(validate_jwt_algorithm("nope").is_err());

        let mut cfg = base_config();
        cfg.jwt_algorithm = "HS512".into();
        assert_eq!(cfg.jwt_algorithm(), Algorithm::HS512);
    }

    #[test]
    fn weak_secrets_are_rejected() {
        assert!(validate_jwt_secret("your-secret-key-change-in-production").is_err());
        assert!(validate_jwt_secret(&"a".repeat(64)).is_err());
        assert!(validate_jwt_secret("a_long_and_varied_test_secret_for_signing_tokens").is_ok());
    }

    #[test]
    fn profile_files_override_built_in_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "port = 9191\notp_length = 4\ngst_api_url = \"https://gst.example.test/v1\"\n",
        )
        .unwrap();

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.port, 9191);
        assert_eq!(cfg.otp_length, 4);
        assert_eq!(cfg.gst_api_url.as_deref(), Some("https://gst.example.test/v1"));
        assert_eq!(cfg.database_url(), "sqlite://storefront.db?mode=rwc");
    }

    #[test]
    fn missing_config_dir_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("absent")).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.otp_max_attempts, DEFAULT_OTP_MAX_ATTEMPTS);
    }

    #[test]
    fn otp_ttls_follow_minutes() {
        let cfg = base_config();
        assert_eq!(cfg.otp_ttl(), Duration::from_secs(600));
        assert_eq!(cfg.reset_otp_ttl(), Duration::from_secs(900));
    }
}
