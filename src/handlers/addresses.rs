use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::{ApiError, ServiceError},
    handlers::common::{
        created, ensure_customer_access, storefront_data, storefront_message, validate_storefront,
    },
    services::commerce::{AddressInput, AddressSummary, AddressUpdate},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
struct AddressName {
    address_name: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LinkAddressRequest {
    #[validate(length(min = 1, message = "link_doctype is required"))]
    pub link_doctype: String,
    #[validate(length(min = 1, message = "link_name is required"))]
    pub link_name: String,
}

pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/:customer/addresses",
            get(list_addresses).post(create_address),
        )
        .route(
            "/customers/:customer/addresses/:address",
            put(update_address).delete(delete_address),
        )
        .route("/addresses/:address", get(get_address))
        .route("/addresses/:address/links", post(link_address))
        .with_auth()
}

/// The caller must reach the address through one of its linked customers.
async fn ensure_address_access(
    state: &AppState,
    user: &AuthUser,
    address_id: Uuid,
) -> Result<(), ApiError> {
    let linked = state
        .services
        .addresses
        .linked_customers(address_id)
        .await
        .map_err(ApiError::storefront)?;
    let accessible = state
        .services
        .customers
        .accessible_customer_ids(&user.email)
        .await
        .map_err(ApiError::storefront)?;

    if linked.iter().any(|id| accessible.contains(id)) {
        Ok(())
    } else {
        Err(ApiError::storefront(ServiceError::Forbidden(
            "Address not found or unauthorized".to_string(),
        )))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer}/addresses",
    tag = "Addresses",
    summary = "Addresses linked to a customer",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Addresses"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    let addresses = state
        .services
        .addresses
        .list_addresses(customer_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(addresses))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers/{customer}/addresses",
    tag = "Addresses",
    summary = "Create an address for a customer",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 201, description = "Address created"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn create_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AddressInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_storefront(&payload)?;
    ensure_customer_access(&state, &user, customer_id).await?;
    let address = state
        .services
        .addresses
        .create_address(customer_id, payload)
        .await
        .map_err(ApiError::storefront)?;
    Ok(created(storefront_message(
        "Address created successfully",
        Some(AddressName {
            address_name: address.id,
        }),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{customer}/addresses/{address}",
    tag = "Addresses",
    summary = "Update a customer address",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
        ("address" = Uuid, Path, description = "Address id"),
    ),
    responses(
        (status = 200, description = "Address updated"),
        (status = 404, description = "Address not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddressUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    let address = state
        .services
        .addresses
        .update_address(customer_id, address_id, payload)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message(
        "Address updated successfully",
        Some(AddressSummary::from(address)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{customer}/addresses/{address}",
    tag = "Addresses",
    summary = "Delete a customer address",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
        ("address" = Uuid, Path, description = "Address id"),
    ),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Address not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    state
        .services
        .addresses
        .delete_address(customer_id, address_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message::<()>("Address deleted successfully", None))
}

#[utoipa::path(
    get,
    path = "/api/v1/addresses/{address}",
    tag = "Addresses",
    summary = "Fetch one address",
    params(
        ("address" = Uuid, Path, description = "Address id"),
    ),
    responses(
        (status = 200, description = "Address"),
        (status = 403, description = "Address not accessible"),
        (status = 404, description = "Address not found"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn get_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(address_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_address_access(&state, &user, address_id).await?;
    let address = state
        .services
        .addresses
        .get_address(address_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(AddressSummary::from(address)))
}

#[utoipa::path(
    post,
    path = "/api/v1/addresses/{address}/links",
    tag = "Addresses",
    summary = "Link an address to another record",
    params(
        ("address" = Uuid, Path, description = "Address id"),
    ),
    responses(
        (status = 200, description = "Link added"),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn link_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(address_id): Path<Uuid>,
    Json(payload): Json<LinkAddressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_storefront(&payload)?;
    ensure_address_access(&state, &user, address_id).await?;

    if payload.link_doctype == "Customer" {
        let target = Uuid::parse_str(&payload.link_name).map_err(|_| {
            ApiError::storefront(ServiceError::ValidationError(
                "link_name must be a customer id".to_string(),
            ))
        })?;
        ensure_customer_access(&state, &user, target).await?;
    }

    let message = state
        .services
        .addresses
        .link_address(address_id, &payload.link_doctype, &payload.link_name)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message::<()>(message, None))
}
