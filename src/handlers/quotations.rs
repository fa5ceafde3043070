use crate::{
    auth::AuthRouterExt,
    errors::ApiError,
    handlers::common::{created, storefront_data, storefront_flat, storefront_message},
    services::quotations::{CreateQuotationInput, EditQuotationInput, DEFAULT_PAGE_SIZE},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct QuotationListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment_method: String,
    pub amount: Option<Decimal>,
    pub transaction_id: Option<String>,
}

pub fn quotation_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/quotations", get(list_quotations).post(create_quotation))
        .route("/quotations/stats", get(quotation_stats))
        .route(
            "/quotations/:id",
            get(get_quotation)
                .put(edit_quotation)
                .delete(delete_quotation),
        )
        .route("/quotations/:id/status", put(update_status))
        .route("/quotations/:id/payments", post(record_payment))
        .route("/quotations/:id/sales-order", post(convert_to_sales_order))
        .with_auth();

    Router::new()
        .route("/companies", get(list_companies))
        .merge(protected)
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations",
    tag = "Quotations",
    summary = "Create a quotation",
    responses(
        (status = 201, description = "Quotation created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Company not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuotationInput>,
) -> Result<impl IntoResponse, ApiError> {
    let created_quotation = state
        .services
        .quotations
        .create_quotation(payload)
        .await
        .map_err(ApiError::storefront)?;
    Ok(created(storefront_message(
        "Quotation created successfully",
        Some(created_quotation),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/quotations",
    tag = "Quotations",
    summary = "Paginated quotations, newest first",
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("page_size" = Option<u64>, Query, description = "Rows per page"),
    ),
    responses(
        (status = 200, description = "Quotations"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<QuotationListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let quotations = state
        .services
        .quotations
        .list_quotations(query.page, query.page_size)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(quotations))
}

#[utoipa::path(
    get,
    path = "/api/v1/quotations/{id}",
    tag = "Quotations",
    summary = "Fetch one quotation",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Quotation"),
        (status = 404, description = "Quotation not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quotation = state
        .services
        .quotations
        .get_quotation_details(id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(quotation))
}

/// The path id wins over any `quotation_id` in the body.
#[utoipa::path(
    put,
    path = "/api/v1/quotations/{id}",
    tag = "Quotations",
    summary = "Edit a quotation",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Quotation updated"),
        (status = 400, description = "Quotation number mismatch"),
        (status = 404, description = "Quotation not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn edit_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<EditQuotationInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload.quotation_id = Some(id);
    let edited = state
        .services
        .quotations
        .edit_quotation(payload)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_flat(edited))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quotations/{id}",
    tag = "Quotations",
    summary = "Delete a draft quotation",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Quotation deleted"),
        (status = 400, description = "Quotation can no longer be deleted"),
        (status = 404, description = "Quotation not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .services
        .quotations
        .delete_quotation(id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message::<()>(message, None))
}

#[utoipa::path(
    put,
    path = "/api/v1/quotations/{id}/status",
    tag = "Quotations",
    summary = "Move a quotation to a new status",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .quotations
        .update_quotation_status(id, payload.status.trim(), payload.notes.as_deref())
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_flat(updated))
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/sales-order",
    tag = "Quotations",
    summary = "Convert a quotation into a sales order",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Sales order created"),
        (status = 400, description = "Quotation already converted"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn convert_to_sales_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let converted = state
        .services
        .quotations
        .convert_to_sales_order(id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_flat(converted))
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/payments",
    tag = "Quotations",
    summary = "Record a payment against an approved quotation",
    params(
        ("id" = Uuid, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Payment recorded"),
        (status = 400, description = "Quotation not approved"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recorded = state
        .services
        .quotations
        .record_payment(
            id,
            &payload.payment_method,
            payload.amount,
            payload.transaction_id.as_deref(),
        )
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_flat(recorded))
}

#[utoipa::path(
    get,
    path = "/api/v1/quotations/stats",
    tag = "Quotations",
    summary = "Quotation totals by status and customer",
    responses(
        (status = 200, description = "Statistics"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn quotation_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .services
        .quotations
        .quotation_stats()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "Quotations",
    summary = "Selling companies",
    responses(
        (status = 200, description = "Companies"),
    ),
)]
pub async fn list_companies(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let companies = state
        .services
        .quotations
        .list_companies()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(companies))
}
