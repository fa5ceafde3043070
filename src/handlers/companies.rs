use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    handlers::common::{created, status_success, validate_input},
    services::company_links::NonGstCompanyInput,
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ActiveCompanyRequest {
    #[validate(length(min = 1, message = "company is required"))]
    pub company: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GstRequest {
    #[validate(length(equal = 15, message = "GST number must be 15 characters"))]
    pub gst_no: String,
}

#[derive(Debug, Deserialize)]
pub struct MobileRequest {
    pub mobile_no: String,
}

#[derive(Debug, Serialize)]
struct CompaniesBody<T: Serialize> {
    companies: T,
    active_company: Option<String>,
}

#[derive(Debug, Serialize)]
struct ActiveCompanyBody {
    message: &'static str,
    active_company: String,
}

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/me/companies", get(get_user_companies))
        .route("/me/active-company", post(set_active_company))
        .route("/onboarding/gst/check", post(check_gst_customer))
        .route("/onboarding/gst", post(create_gst_customer))
        .route("/onboarding/non-gst/check", post(check_non_gst_customer))
        .route("/onboarding/non-gst", post(create_non_gst_customer))
        .with_auth()
}

#[utoipa::path(
    get,
    path = "/api/v1/me/companies",
    tag = "Companies",
    summary = "Companies the user is linked to",
    responses(
        (status = 200, description = "Linked companies"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn get_user_companies(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let links = &state.services.company_links;
    let companies = links.get_user_companies(&user.email).await?;
    let active_company = links.active_company(&user.email).await?;
    Ok(status_success(CompaniesBody {
        companies,
        active_company,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/me/active-company",
    tag = "Companies",
    summary = "Choose the active company",
    responses(
        (status = 200, description = "Active company set"),
        (status = 403, description = "Company not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn set_active_company(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ActiveCompanyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let active_company = state
        .services
        .company_links
        .set_active_company(&user.email, payload.company.trim())
        .await?;
    Ok(status_success(ActiveCompanyBody {
        message: "Active company set successfully",
        active_company,
    }))
}

/// Links the caller to an existing customer with this GSTIN, or reports `new_gst`.
#[utoipa::path(
    post,
    path = "/api/v1/onboarding/gst/check",
    tag = "Companies",
    summary = "Look up a GST number before onboarding",
    responses(
        (status = 200, description = "Lookup result"),
        (status = 400, description = "Invalid GST number"),
        (status = 502, description = "GST lookup unavailable"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn check_gst_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<GstRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let check = state
        .services
        .company_links
        .check_gst_customer(&user.email, &payload.gst_no.trim().to_uppercase())
        .await?;
    Ok(Json(check))
}

#[utoipa::path(
    post,
    path = "/api/v1/onboarding/gst",
    tag = "Companies",
    summary = "Create a customer from GST registration data",
    responses(
        (status = 201, description = "Customer created"),
        (status = 409, description = "GST number already registered"),
        (status = 502, description = "GST lookup unavailable"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn create_gst_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<GstRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let outcome = state
        .services
        .company_links
        .create_gst_customer(&user.email, &payload.gst_no.trim().to_uppercase())
        .await?;
    Ok(created(Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/onboarding/non-gst/check",
    tag = "Companies",
    summary = "Look up a company by mobile number",
    responses(
        (status = 200, description = "Lookup result"),
        (status = 400, description = "Invalid mobile number"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn check_non_gst_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<MobileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let check = state
        .services
        .company_links
        .check_non_gst_customer(&user.email, payload.mobile_no.trim())
        .await?;
    Ok(Json(check))
}

#[utoipa::path(
    post,
    path = "/api/v1/onboarding/non-gst",
    tag = "Companies",
    summary = "Create a customer without a GST number",
    responses(
        (status = 201, description = "Customer created"),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn create_non_gst_customer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NonGstCompanyInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let outcome = state
        .services
        .company_links
        .create_non_gst_customer(&user.email, payload)
        .await?;
    Ok(created(Json(outcome)))
}
