use crate::{errors::ApiError, handlers::common::storefront_data, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Public catalogue reads
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products/:item_code", get(get_product))
        .route("/item-groups", get(item_groups))
        .route("/homepage", get(homepage))
        .route("/homepage/products", get(homepage_products))
        .route("/homepage/header", get(homepage_header))
        .route("/tracking-keys", get(tracking_keys))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{item_code}",
    tag = "Catalog",
    summary = "Product detail with price and stock",
    params(
        ("item_code" = String, Path, description = "Item code"),
    ),
    responses(
        (status = 200, description = "Product"),
        (status = 404, description = "Product not found"),
    ),
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(item_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .catalog
        .get_product_detail(&item_code)
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/item-groups",
    tag = "Catalog",
    summary = "Item groups shown in the storefront",
    responses(
        (status = 200, description = "Item groups"),
    ),
)]
pub async fn item_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tree = state
        .services
        .catalog
        .get_item_groups()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(tree))
}

#[utoipa::path(
    get,
    path = "/api/v1/homepage",
    tag = "Catalog",
    summary = "Homepage sections",
    responses(
        (status = 200, description = "Homepage content"),
    ),
)]
pub async fn homepage(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .services
        .catalog
        .get_homepage_data()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(data))
}

#[utoipa::path(
    get,
    path = "/api/v1/homepage/products",
    tag = "Catalog",
    summary = "Featured homepage products",
    responses(
        (status = 200, description = "Products"),
    ),
)]
pub async fn homepage_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .services
        .catalog
        .get_homepage_products()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/homepage/header",
    tag = "Catalog",
    summary = "Homepage header settings",
    responses(
        (status = 200, description = "Header settings"),
    ),
)]
pub async fn homepage_header(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let header = state
        .services
        .catalog
        .get_homepage_header()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(header))
}

#[utoipa::path(
    get,
    path = "/api/v1/tracking-keys",
    tag = "Catalog",
    summary = "Analytics tracking keys",
    responses(
        (status = 200, description = "Tracking keys"),
    ),
)]
pub async fn tracking_keys(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let keys = state
        .services
        .catalog
        .get_tracking_keys()
        .await
        .map_err(ApiError::storefront)?;
    Ok(storefront_data(keys))
}
