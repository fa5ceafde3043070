use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ApiError,
    handlers::common::{ensure_customer_access, storefront_data, storefront_message},
    services::commerce::CartUpdate,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct CartRef {
    cart_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitCartRequest {
    pub cart_id: Option<Uuid>,
}

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    let customer_scoped = Router::new()
        .route("/customers/:customer/cart", get(get_cart).post(update_cart))
        .route("/customers/:customer/cart/clear", post(clear_cart))
        .route("/customers/:customer/cart/submit", post(submit_cart))
        .with_auth();

    Router::new()
        .route("/shipping-processes", get(shipping_processes))
        .merge(customer_scoped)
}

#[utoipa::path(
    get,
    path = "/api/v1/shipping-processes",
    tag = "Cart",
    summary = "Available shipping processes",
    responses(
        (status = 200, description = "Shipping processes"),
    ),
)]
pub async fn shipping_processes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let processes = state
        .services
        .carts
        .get_shipping_processes()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(processes))
}

/// Add, replace or remove items and set the shipping process or addresses
#[utoipa::path(
    post,
    path = "/api/v1/customers/{customer}/cart",
    tag = "Cart",
    summary = "Create or replace the Quick Order cart",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Cart saved"),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn update_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CartUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    let cart_id = state
        .services
        .carts
        .update_cart(customer_id, payload)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message(
        "Cart updated successfully",
        Some(CartRef { cart_id }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{customer}/cart",
    tag = "Cart",
    summary = "Current Quick Order cart",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Cart"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    let cart = state
        .services
        .carts
        .get_cart(customer_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers/{customer}/cart/clear",
    tag = "Cart",
    summary = "Remove every cart item",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Cart cleared"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    state
        .services
        .carts
        .clear_cart(customer_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message::<()>("Cart cleared", None))
}

/// The body is optional; without a `cart_id` the customer's draft is submitted.
#[utoipa::path(
    post,
    path = "/api/v1/customers/{customer}/cart/submit",
    tag = "Cart",
    summary = "Submit the cart as an order request",
    params(
        ("customer" = Uuid, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Cart submitted"),
        (status = 400, description = "Cart is empty"),
        (status = 403, description = "Customer not accessible"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("token" = []))
)]
pub async fn submit_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(customer_id): Path<Uuid>,
    payload: Option<Json<SubmitCartRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_customer_access(&state, &user, customer_id).await?;
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let cart_id = state
        .services
        .carts
        .submit_cart(customer_id, request.cart_id)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_message(
        "Cart submitted successfully",
        Some(CartRef { cart_id }),
    ))
}
