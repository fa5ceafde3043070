use axum::{response::Json, routing::get, Router};
use lazy_static::lazy_static;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::AppState;

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = r#"
# Storefront API

Backend for a B2B storefront.

## Authentication

Protected endpoints expect the JWT access token in the `Token` header:

```
Token: <access-token>
```

Tokens come from `/api/v1/auth/login`, `/api/v1/auth/login-otp/verify` or
signup completion, and are renewed with `/api/v1/auth/refresh`.

## Response envelopes

Storefront endpoints answer with `{"success": true, "data": ...}` or
`{"success": false, "error": "..."}`. Account and onboarding endpoints answer
with `{"status": "success", ...}` or `{"status": "error", "message": "..."}`.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Signup, login, OTP and password reset"),
        (name = "Addresses", description = "Customer addresses"),
        (name = "Cart", description = "Quick Order cart"),
        (name = "Catalog", description = "Public catalogue reads"),
        (name = "Quotations", description = "Quotations, sales orders and payments"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Companies", description = "Company links and GST onboarding"),
        (name = "Health", description = "Health and status checks")
    ),
    paths(
        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::validate_token,
        crate::handlers::auth::current_user,
        crate::handlers::auth::send_signup_otp,
        crate::handlers::auth::verify_signup_otp,
        crate::handlers::auth::complete_signup,
        crate::handlers::auth::resend_signup_otp,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::verify_reset_otp,
        crate::handlers::auth::reset_password,
        crate::handlers::auth::resend_reset_otp,
        crate::handlers::auth::send_login_otp,
        crate::handlers::auth::verify_login_otp,
        crate::handlers::auth::logout,

        // Addresses
        crate::handlers::addresses::list_addresses,
        crate::handlers::addresses::create_address,
        crate::handlers::addresses::update_address,
        crate::handlers::addresses::delete_address,
        crate::handlers::addresses::get_address,
        crate::handlers::addresses::link_address,

        // Cart
        crate::handlers::commerce::carts::shipping_processes,
        crate::handlers::commerce::carts::update_cart,
        crate::handlers::commerce::carts::get_cart,
        crate::handlers::commerce::carts::clear_cart,
        crate::handlers::commerce::carts::submit_cart,

        // Catalog
        crate::handlers::commerce::products::get_product,
        crate::handlers::commerce::products::item_groups,
        crate::handlers::commerce::products::homepage,
        crate::handlers::commerce::products::homepage_products,
        crate::handlers::commerce::products::homepage_header,
        crate::handlers::commerce::products::tracking_keys,

        // Quotations
        crate::handlers::quotations::create_quotation,
        crate::handlers::quotations::list_quotations,
        crate::handlers::quotations::get_quotation,
        crate::handlers::quotations::edit_quotation,
        crate::handlers::quotations::delete_quotation,
        crate::handlers::quotations::update_status,
        crate::handlers::quotations::convert_to_sales_order,
        crate::handlers::quotations::record_payment,
        crate::handlers::quotations::quotation_stats,
        crate::handlers::quotations::list_companies,

        // Notifications
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::unread_count,
        crate::handlers::notifications::mark_as_read,
        crate::handlers::notifications::mark_all_as_read,

        // Companies
        crate::handlers::companies::get_user_companies,
        crate::handlers::companies::set_active_company,
        crate::handlers::companies::check_gst_customer,
        crate::handlers::companies::create_gst_customer,
        crate::handlers::companies::check_non_gst_customer,
        crate::handlers::companies::create_non_gst_customer,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,
    ),
    modifiers(&TokenHeader)
)]
pub struct ApiDoc;

/// Registers the `Token` header scheme the protected paths refer to.
struct TokenHeader;

impl Modify for TokenHeader {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Token"))),
        );
    }
}

lazy_static! {
    static ref OPENAPI_DOC: utoipa::openapi::OpenApi = ApiDoc::openapi();
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(OPENAPI_DOC.clone())
}

pub fn openapi_routes() -> Router<AppState> {
    Router::new().route(OPENAPI_JSON_PATH, get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = json["paths"].as_object().unwrap();

        for path in [
            "/api/v1/auth/login",
            "/api/v1/customers/{customer}/addresses",
            "/api/v1/customers/{customer}/cart/submit",
            "/api/v1/products/{item_code}",
            "/api/v1/quotations/{id}/payments",
            "/api/v1/notifications/read-all",
            "/api/v1/onboarding/gst",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }

        // GET and PUT and DELETE share one path item
        let quotation = &paths["/api/v1/quotations/{id}"];
        assert!(quotation.get("get").is_some());
        assert!(quotation.get("put").is_some());
        assert!(quotation.get("delete").is_some());
    }

    #[test]
    fn protected_paths_require_the_token_header() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(
            json["components"]["securitySchemes"]["token"]["in"],
            "header"
        );
        assert_eq!(
            json["components"]["securitySchemes"]["token"]["name"],
            "Token"
        );
        assert!(json["paths"]["/api/v1/notifications"]["get"]["security"].is_array());
        assert!(json["paths"]["/api/v1/auth/login"]["post"]
            .get("security")
            .is_none());
    }
}
