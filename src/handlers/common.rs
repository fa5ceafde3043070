use crate::{
    auth::AuthUser,
    errors::{ApiError, ServiceError},
    AppState,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

/// `{"status": "success", ...body}` used by the auth, notification and company groups.
#[derive(Debug, Serialize)]
pub struct StatusEnvelope<T> {
    pub status: &'static str,
    #[serde(flatten)]
    pub body: T,
}

pub fn status_success<T: Serialize>(body: T) -> Json<StatusEnvelope<T>> {
    Json(StatusEnvelope {
        status: "success",
        body,
    })
}

/// `{"success": true, "message": ..., "data": ...}` used by the commerce and quotation groups.
#[derive(Debug, Serialize)]
pub struct StorefrontResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn storefront_data<T: Serialize>(data: T) -> Json<StorefrontResponse<T>> {
    Json(StorefrontResponse {
        success: true,
        message: None,
        data: Some(data),
    })
}

pub fn storefront_message<T: Serialize>(
    message: impl Into<String>,
    data: Option<T>,
) -> Json<StorefrontResponse<T>> {
    Json(StorefrontResponse {
        success: true,
        message: Some(message.into()),
        data,
    })
}

/// `{"success": true, ...body}` for results that already carry their message.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub fn storefront_flat<T: Serialize>(body: T) -> Json<SuccessEnvelope<T>> {
    Json(SuccessEnvelope {
        success: true,
        body,
    })
}

pub fn created<T: IntoResponse>(body: T) -> Response {
    (StatusCode::CREATED, body).into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input.validate().map_err(ApiError::from)
}

/// Validation for the commerce groups, reported in their envelope.
pub fn validate_storefront<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::storefront(ServiceError::from(e)))
}

/// Fails with 403 unless the caller may act on `customer_id`.
pub async fn ensure_customer_access(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
) -> Result<(), ApiError> {
    state
        .services
        .customers
        .ensure_access(customer_id, &user.email)
        .await
        .map_err(ApiError::storefront)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Dispatch {
        message: &'static str,
        expires_in: u64,
    }

    #[test]
    fn status_envelope_flattens_body() {
        let Json(body) = status_success(Dispatch {
            message: "OTP generated successfully",
            expires_in: 600,
        });
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"status": "success", "message": "OTP generated successfully", "expires_in": 600})
        );
    }

    #[test]
    fn storefront_envelope_omits_missing_parts() {
        let Json(body) = storefront_message::<()>("Cart cleared", None);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "message": "Cart cleared"})
        );

        let Json(body) = storefront_data(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"success": true, "data": [1, 2]})
        );
    }
}
