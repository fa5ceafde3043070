use crate::{
    auth::{
        password_policy::validate_password_strength,
        validators::{validate_email_shape, validate_full_name, validate_otp, validate_phone},
        AuthRouterExt, AuthUser, TokenPair,
    },
    errors::ApiError,
    handlers::common::{status_success, validate_input},
    AppState,
};
use axum::{
    extract::{DefaultBodyLimit, Json, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Auth bodies are small; anything larger is rejected before parsing.
const AUTH_BODY_LIMIT: usize = 16 * 1024;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 10, message = "Invalid refresh token"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateTokenRequest {
    #[validate(length(min = 10, message = "Invalid token"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupOtpRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_full_name")]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhoneOtpRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteSignupRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    #[validate(custom = "validate_email_shape")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhoneRequest {
    #[validate(custom = "validate_phone")]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(custom = "validate_email_shape")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetOtpRequest {
    #[validate(length(min = 6, message = "Identifier must be at least 6 characters"))]
    pub identifier: String,
    #[validate(custom = "validate_otp")]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IdentifierRequest {
    #[validate(length(min = 6, message = "Identifier must be at least 6 characters"))]
    pub identifier: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 10, message = "Invalid or expired reset token"))]
    pub reset_token: String,
    #[validate(custom = "validate_password_strength")]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
struct OtpLogin {
    message: &'static str,
    #[serde(flatten)]
    tokens: TokenPair,
}

#[derive(Debug, Serialize)]
struct MessageOnly {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct CurrentUser {
    user: crate::services::accounts::UserProfile,
}

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/validate", post(validate_token))
        .route("/signup/otp", post(send_signup_otp))
        .route("/signup/verify", post(verify_signup_otp))
        .route("/signup/complete", post(complete_signup))
        .route("/signup/resend", post(resend_signup_otp))
        .route("/password/forgot", post(forgot_password))
        .route("/password/verify-otp", post(verify_reset_otp))
        .route("/password/reset", post(reset_password))
        .route("/password/resend", post(resend_reset_otp))
        .route("/login-otp/send", post(send_login_otp))
        .route("/login-otp/verify", post(verify_login_otp))
        .layer(DefaultBodyLimit::max(AUTH_BODY_LIMIT))
}

/// Routes that need a valid access token.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_user))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(AUTH_BODY_LIMIT))
        .with_auth()
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in with email or mobile and password",
    responses(
        (status = 200, description = "Access and refresh tokens issued"),
        (status = 400, description = "Missing or malformed credentials"),
        (status = 401, description = "Invalid credentials"),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let session = state
        .services
        .accounts
        .login(&payload.username, &payload.password)
        .await?;
    Ok(status_success(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    summary = "Exchange a refresh token for a new token pair",
    responses(
        (status = 200, description = "New token pair issued"),
        (status = 401, description = "Refresh token invalid or revoked"),
    ),
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let token = state
        .services
        .accounts
        .refresh_token(&payload.refresh_token)
        .await?;
    Ok(status_success(token))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/validate",
    tag = "Auth",
    summary = "Check whether an access token is still valid",
    responses(
        (status = 200, description = "Validation result"),
    ),
)]
pub async fn validate_token(
    State(state): State<AppState>,
    Json(payload): Json<ValidateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let validation = state
        .services
        .accounts
        .validate_token(&payload.token)
        .await?;
    Ok(Json(validation))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    summary = "Profile of the signed-in user",
    responses(
        (status = 200, description = "User profile"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.services.accounts.current_user(&user.email).await?;
    Ok(status_success(CurrentUser { user: profile }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup/otp",
    tag = "Auth",
    summary = "Send a signup OTP to a mobile number",
    responses(
        (status = 200, description = "OTP sent"),
        (status = 400, description = "Invalid mobile number"),
        (status = 409, description = "Mobile number already registered"),
        (status = 429, description = "Too many OTP requests"),
    ),
)]
pub async fn send_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<SignupOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let dispatch = state
        .services
        .accounts
        .send_signup_otp(&payload.phone, payload.full_name.trim())
        .await?;
    Ok(status_success(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup/verify",
    tag = "Auth",
    summary = "Verify a signup OTP",
    responses(
        (status = 200, description = "Mobile number verified"),
        (status = 400, description = "Invalid or expired OTP"),
    ),
)]
pub async fn verify_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<PhoneOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let verified = state
        .services
        .accounts
        .verify_signup_otp(&payload.phone, &payload.otp)
        .await?;
    Ok(status_success(verified))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup/complete",
    tag = "Auth",
    summary = "Create the account after OTP verification",
    responses(
        (status = 200, description = "Account created"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    ),
)]
pub async fn complete_signup(
    State(state): State<AppState>,
    Json(payload): Json<CompleteSignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let session = state
        .services
        .accounts
        .complete_signup(&payload.phone, &payload.password, payload.email.as_deref())
        .await?;
    Ok(status_success(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup/resend",
    tag = "Auth",
    summary = "Resend the signup OTP",
    responses(
        (status = 200, description = "OTP resent"),
        (status = 429, description = "Too many OTP requests"),
    ),
)]
pub async fn resend_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<PhoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let dispatch = state
        .services
        .accounts
        .resend_signup_otp(&payload.phone)
        .await?;
    Ok(status_success(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/forgot",
    tag = "Auth",
    summary = "Start a password reset",
    responses(
        (status = 200, description = "Reset OTP generated"),
        (status = 404, description = "No account for the identifier"),
    ),
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let dispatch = state
        .services
        .accounts
        .forgot_password_request(payload.phone.as_deref(), payload.email.as_deref())
        .await?;
    Ok(status_success(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/verify-otp",
    tag = "Auth",
    summary = "Verify a password reset OTP",
    responses(
        (status = 200, description = "OTP verified"),
        (status = 400, description = "Invalid or expired OTP"),
    ),
)]
pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResetOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let verified = state
        .services
        .accounts
        .verify_reset_otp(&payload.identifier, &payload.otp)
        .await?;
    Ok(status_success(verified))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/reset",
    tag = "Auth",
    summary = "Set a new password with a verified OTP",
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Validation failed"),
    ),
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let done = state
        .services
        .accounts
        .reset_password(
            &payload.reset_token,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;
    Ok(status_success(done))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/password/resend",
    tag = "Auth",
    summary = "Resend the password reset OTP",
    responses(
        (status = 200, description = "OTP resent"),
        (status = 429, description = "Too many OTP requests"),
    ),
)]
pub async fn resend_reset_otp(
    State(state): State<AppState>,
    Json(payload): Json<IdentifierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let dispatch = state
        .services
        .accounts
        .resend_reset_otp(&payload.identifier)
        .await?;
    Ok(status_success(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login-otp/send",
    tag = "Auth",
    summary = "Send a login OTP to a registered mobile number",
    responses(
        (status = 200, description = "OTP sent"),
        (status = 404, description = "Mobile number not registered"),
    ),
)]
pub async fn send_login_otp(
    State(state): State<AppState>,
    Json(payload): Json<PhoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let dispatch = state.services.accounts.send_login_otp(&payload.phone).await?;
    Ok(status_success(dispatch))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login-otp/verify",
    tag = "Auth",
    summary = "Log in with a mobile OTP",
    responses(
        (status = 200, description = "Tokens issued"),
        (status = 400, description = "Invalid or expired OTP"),
    ),
)]
pub async fn verify_login_otp(
    State(state): State<AppState>,
    Json(payload): Json<PhoneOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let tokens = state
        .services
        .accounts
        .verify_login_otp(&payload.phone, &payload.otp)
        .await?;
    Ok(status_success(OtpLogin {
        message: "Login successful",
        tokens,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    summary = "Revoke the current session",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    state
        .services
        .accounts
        .logout(&user.email, &payload.refresh_token)
        .await?;
    Ok(status_success(MessageOnly {
        message: "Logged out successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_otp_request_reports_each_field() {
        let request = SignupOtpRequest {
            phone: "98765abc".into(),
            full_name: " A ".into(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("full_name"));
    }

    #[test]
    fn complete_signup_email_is_optional() {
        let request = CompleteSignupRequest {
            phone: "9876543210".into(),
            password: "Str0ng!pass".into(),
            email: None,
        };
        assert!(request.validate().is_ok());

        let request = CompleteSignupRequest {
            email: Some("not-an-email".into()),
            ..request
        };
        assert!(request.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn weak_reset_password_is_rejected() {
        let request = ResetPasswordRequest {
            reset_token: "abcdefghijklmnop".into(),
            new_password: "password".into(),
            confirm_password: "password".into(),
        };
        assert!(request
            .validate()
            .unwrap_err()
            .field_errors()
            .contains_key("new_password"));
    }
}
