//! Client for the GSTIN lookup API used during business onboarding.
//!
//! The provider is addressed as `GET {gst_api_url}/{gstin}` with a bearer key
//! and answers with the registered legal name and principal place of business.

use crate::{config::AppConfig, errors::ServiceError};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Debug, Error)]
pub enum GstError {
    #[error("GST API not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GST API returned status {0}")]
    Status(u16),

    #[error("GST API response has no legal name")]
    MissingLegalName,
}

impl From<GstError> for ServiceError {
    fn from(err: GstError) -> Self {
        match err {
            GstError::NotConfigured => ServiceError::ExternalServiceError(err.to_string()),
            other => {
                warn!(error = %other, "GST lookup failed");
                ServiceError::ExternalServiceError("Failed to fetch GST details".to_string())
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PrincipalPlace {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GstApiResponse {
    legal_name: Option<String>,
    trade_name: Option<String>,
    #[serde(default)]
    principal_place: Option<PrincipalPlace>,
    state: Option<String>,
    status: Option<String>,
}

/// Registration details of a GSTIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GstDetails {
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct GstClient {
    client: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl GstClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GstError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GstError> {
        Self::new(
            config.gst_api_url.clone(),
            config.gst_api_key.clone(),
            Duration::from_secs(config.gst_api_timeout_secs),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }

    #[instrument(skip(self))]
    pub async fn fetch_details(&self, gstin: &str) -> Result<GstDetails, GstError> {
        let (Some(base_url), Some(api_key)) = (&self.base_url, &self.api_key) else {
            return Err(GstError::NotConfigured);
        };

        let response = self
            .client
            .get(format!("{}/{}", base_url, gstin))
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(GstError::Status(response.status().as_u16()));
        }

        let body: GstApiResponse = response.json().await?;
        let legal_name = body
            .legal_name
            .filter(|n| !n.trim().is_empty())
            .ok_or(GstError::MissingLegalName)?;

        Ok(GstDetails {
            legal_name,
            trade_name: body.trade_name,
            address: body.principal_place.and_then(|p| p.address),
            state: body.state,
            status: body.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GstClient {
        GstClient::new(
            Some(format!("{}/gst/", server.uri())),
            Some("test-key".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_registration_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gst/27AAPFU0939F1ZV"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "legal_name": "Umbrella Traders LLP",
                "trade_name": "Umbrella",
                "principal_place": {"address": "12 Dock Road, Pune"},
                "state": "Maharashtra",
                "status": "Active"
            })))
            .mount(&server)
            .await;

        let details = client_for(&server)
            .fetch_details("27AAPFU0939F1ZV")
            .await
            .unwrap();
        assert_eq!(details.legal_name, "Umbrella Traders LLP");
        assert_eq!(details.address.as_deref(), Some("12 Dock Road, Pune"));
        assert_eq!(details.state.as_deref(), Some("Maharashtra"));
    }

    #[tokio::test]
    async fn non_ok_status_is_an_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_details("27AAPFU0939F1ZV")
            .await
            .unwrap_err();
        assert_matches!(err, GstError::Status(404));
        assert_matches!(
            ServiceError::from(err),
            ServiceError::ExternalServiceError(msg) if msg == "Failed to fetch GST details"
        );
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_lookups() {
        let client = GstClient::new(None, None, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());
        assert_matches!(
            client.fetch_details("27AAPFU0939F1ZV").await,
            Err(GstError::NotConfigured)
        );
    }
}
