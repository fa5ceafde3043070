//! One-time passwords for the signup, login and password reset flows.
//!
//! Only a SHA-256 digest of the code is stored, under
//! `otp_{purpose}_{identifier}`, together with the wrong-guess counter, the
//! resend counter and whatever the flow needs to carry to its next step.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{self, CacheBackend};
use crate::config::AppConfig;
use crate::errors::ServiceError;

const FALLBACK_OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Signup,
    Login,
    Reset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::Login => "login",
            OtpPurpose::Reset => "reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OtpEntry {
    pub otp_hash: String,
    pub attempts: u32,
    pub resend_attempts: u32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl OtpEntry {
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Freshly issued code. `code` goes to the user, never into a response.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_in: u64,
}

/// Outcome of checking a submitted code.
#[derive(Debug)]
pub enum OtpCheck {
    Missing,
    Locked,
    Mismatch,
    Valid(OtpEntry),
}

#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub length: usize,
    pub resend_limit: u32,
    pub max_attempts: u32,
    pub fixed_code: Option<String>,
}

impl OtpSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            length: config.otp_length,
            resend_limit: config.otp_resend_limit_per_hour,
            max_attempts: config.otp_max_attempts,
            fixed_code: config.effective_otp_fixed_code().map(str::to_string),
        }
    }
}

pub fn hash_otp(otp: &str) -> String {
    hex::encode(Sha256::digest(otp.as_bytes()))
}

/// Random numeric code; lengths outside 1..=9 fall back to six digits.
pub fn generate_otp(length: usize) -> String {
    let length = if (1..=9).contains(&length) {
        length
    } else {
        FALLBACK_OTP_LENGTH
    };
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[derive(Clone)]
pub struct OtpStore {
    cache: Arc<dyn CacheBackend>,
    settings: OtpSettings,
}

impl OtpStore {
    pub fn new(cache: Arc<dyn CacheBackend>, settings: OtpSettings) -> Self {
        Self { cache, settings }
    }

    pub fn key(purpose: OtpPurpose, identifier: &str) -> String {
        format!("otp_{}_{}", purpose, identifier)
    }

    fn next_code(&self) -> String {
        match &self.settings.fixed_code {
            Some(code) => code.clone(),
            None => generate_otp(self.settings.length),
        }
    }

    pub async fn load(
        &self,
        purpose: OtpPurpose,
        identifier: &str,
    ) -> Result<Option<OtpEntry>, ServiceError> {
        Ok(cache::get_json(self.cache.as_ref(), &Self::key(purpose, identifier)).await?)
    }

    async fn store(
        &self,
        purpose: OtpPurpose,
        identifier: &str,
        entry: &OtpEntry,
        ttl: Duration,
    ) -> Result<(), ServiceError> {
        cache::set_json(
            self.cache.as_ref(),
            &Self::key(purpose, identifier),
            entry,
            Some(ttl),
        )
        .await?;
        Ok(())
    }

    /// Issues a new code, replacing any live one.
    ///
    /// A replacement counts as a resend; past the resend limit the request is
    /// refused until the live entry expires. Extra values from the replaced
    /// entry survive unless overwritten.
    pub async fn issue(
        &self,
        purpose: OtpPurpose,
        identifier: &str,
        extra: BTreeMap<String, String>,
        ttl: Duration,
    ) -> Result<IssuedOtp, ServiceError> {
        let existing = self.load(purpose, identifier).await?;

        let (resend_attempts, mut merged_extra) = match existing {
            Some(entry) => (entry.resend_attempts + 1, entry.extra),
            None => (0, BTreeMap::new()),
        };
        if resend_attempts > self.settings.resend_limit {
            return Err(ServiceError::RateLimitExceeded(
                "OTP resend limit exceeded. Please try again after some time.".to_string(),
            ));
        }
        merged_extra.extend(extra);

        let code = self.next_code();
        let entry = OtpEntry {
            otp_hash: hash_otp(&code),
            attempts: 0,
            resend_attempts,
            verified: false,
            created_at: Utc::now(),
            extra: merged_extra,
        };
        self.store(purpose, identifier, &entry, ttl).await?;

        info!("OTP generated for {} ({})", identifier, purpose);
        Ok(IssuedOtp {
            code,
            expires_in: ttl.as_secs(),
        })
    }

    /// Checks `otp`; a wrong guess is counted and the entry re-stored for `ttl`.
    pub async fn check(
        &self,
        purpose: OtpPurpose,
        identifier: &str,
        otp: &str,
        ttl: Duration,
    ) -> Result<OtpCheck, ServiceError> {
        let Some(mut entry) = self.load(purpose, identifier).await? else {
            return Ok(OtpCheck::Missing);
        };

        if entry.attempts >= self.settings.max_attempts {
            return Ok(OtpCheck::Locked);
        }

        if hash_otp(otp.trim()) != entry.otp_hash {
            entry.attempts += 1;
            self.store(purpose, identifier, &entry, ttl).await?;
            return Ok(OtpCheck::Mismatch);
        }

        Ok(OtpCheck::Valid(entry))
    }

    pub async fn mark_verified(
        &self,
        purpose: OtpPurpose,
        identifier: &str,
        mut entry: OtpEntry,
        ttl: Duration,
    ) -> Result<OtpEntry, ServiceError> {
        entry.verified = true;
        self.store(purpose, identifier, &entry, ttl).await?;
        Ok(entry)
    }

    pub async fn remove(&self, purpose: OtpPurpose, identifier: &str) -> Result<(), ServiceError> {
        self.cache.delete(&Self::key(purpose, identifier)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use assert_matches::assert_matches;

    const TTL: Duration = Duration::from_secs(600);

    fn store(fixed: Option<&str>) -> OtpStore {
        OtpStore::new(
            Arc::new(InMemoryCache::new()),
            OtpSettings {
                length: 6,
                resend_limit: 2,
                max_attempts: 3,
                fixed_code: fixed.map(str::to_string),
            },
        )
    }

    #[test]
    fn generated_codes_are_numeric_with_fallback_length() {
        let code = generate_otp(4);
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(generate_otp(0).len(), 6);
        assert_eq!(generate_otp(12).len(), 6);
    }

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_otp("123456"),
            "8d969eef6ecad3c29a3a629280e686cf0c3f5d5a86aff3ca12020c923adc6c92"
        );
    }

    #[tokio::test]
    async fn issue_then_check() {
        let otps = store(Some("246810"));
        let issued = otps
            .issue(OtpPurpose::Signup, "9876543210", BTreeMap::new(), TTL)
            .await
            .unwrap();
        assert_eq!(issued.code, "246810");
        assert_eq!(issued.expires_in, 600);

        let check = otps
            .check(OtpPurpose::Signup, "9876543210", "246810", TTL)
            .await
            .unwrap();
        assert_matches!(check, OtpCheck::Valid(entry) if entry.attempts == 0);
    }

    #[tokio::test]
    async fn wrong_guesses_lock_the_entry() {
        let otps = store(Some("246810"));
        otps.issue(OtpPurpose::Login, "9876543210", BTreeMap::new(), TTL)
            .await
            .unwrap();

        for _ in 0..3 {
            let check = otps
                .check(OtpPurpose::Login, "9876543210", "000000", TTL)
                .await
                .unwrap();
            assert_matches!(check, OtpCheck::Mismatch);
        }
        let check = otps
            .check(OtpPurpose::Login, "9876543210", "246810", TTL)
            .await
            .unwrap();
        assert_matches!(check, OtpCheck::Locked);
    }

    #[tokio::test]
    async fn missing_entry() {
        let otps = store(None);
        let check = otps
            .check(OtpPurpose::Reset, "a@b.co", "123456", TTL)
            .await
            .unwrap();
        assert_matches!(check, OtpCheck::Missing);
    }

    #[tokio::test]
    async fn resends_are_limited_and_keep_extra() {
        let otps = store(Some("111111"));
        let mut extra = BTreeMap::new();
        extra.insert("full_name".to_string(), "Asha Rao".to_string());
        otps.issue(OtpPurpose::Signup, "9876543210", extra, TTL)
            .await
            .unwrap();

        otps.issue(OtpPurpose::Signup, "9876543210", BTreeMap::new(), TTL)
            .await
            .unwrap();
        otps.issue(OtpPurpose::Signup, "9876543210", BTreeMap::new(), TTL)
            .await
            .unwrap();

        let entry = otps
            .load(OtpPurpose::Signup, "9876543210")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.resend_attempts, 2);
        assert_eq!(entry.extra("full_name"), Some("Asha Rao"));

        let err = otps
            .issue(OtpPurpose::Signup, "9876543210", BTreeMap::new(), TTL)
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::RateLimitExceeded(_));
    }
}
