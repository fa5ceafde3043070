mod common;

use axum::http::{Method, StatusCode};
use common::{test_config, TestApp};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GSTIN: &str = "27AAPFU0939F1ZV";

async fn app_with_gst_registry() -> (TestApp, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/gst/{}", GSTIN)))
        .and(header("authorization", "Bearer gst-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "legal_name": "Umiya Fasteners Private Limited",
            "trade_name": "Umiya Fasteners",
            "principal_place": {"address": "Plot 7, MIDC Bhosari"},
            "state": "Maharashtra",
            "status": "Active"
        })))
        .mount(&server)
        .await;

    let mut cfg = test_config();
    cfg.gst_api_url = Some(format!("{}/gst", server.uri()));
    cfg.gst_api_key = Some("gst-test-key".to_string());
    (TestApp::with_config(cfg).await, server)
}

#[tokio::test]
async fn gst_onboarding_creates_a_company_customer() {
    let (app, _server) = app_with_gst_registry().await;
    let founder = app.account("founder@example.com", "9000000501").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/gst/check",
            Some(json!({"gst_no": GSTIN})),
            Some(&founder.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "new_gst");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/gst",
            Some(json!({"gst_no": GSTIN})),
            Some(&founder.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "success");
    let customer = body["customer"].as_str().unwrap().to_string();

    // The founder administers the new customer and sees its registered address.
    let (_, body) = app
        .json(Method::GET, "/api/v1/me/companies", None, Some(&founder.token))
        .await;
    let link = body["companies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == customer.as_str())
        .cloned()
        .unwrap();
    assert_eq!(link["role"], "Admin");
    assert_eq!(link["type"], "Customer");

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/customers/{}/addresses", customer),
            None,
            Some(&founder.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["address_line1"], "Plot 7, MIDC Bhosari");
    assert_eq!(body["data"][0]["state"], "Maharashtra");

    // Registering the same GSTIN twice conflicts.
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/gst",
            Some(json!({"gst_no": GSTIN})),
            Some(&founder.token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A customer with this GST number already exists");
}

#[tokio::test]
async fn colleagues_of_a_known_gstin_wait_for_approval() {
    let (app, _server) = app_with_gst_registry().await;
    let founder = app.account("founder@example.com", "9000000502").await;
    let colleague = app.account("colleague@example.com", "9000000503").await;
    app.json(
        Method::POST,
        "/api/v1/onboarding/gst",
        Some(json!({"gst_no": GSTIN})),
        Some(&founder.token),
    )
    .await;

    for _ in 0..2 {
        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/onboarding/gst/check",
                Some(json!({"gst_no": GSTIN.to_lowercase()})),
                Some(&colleague.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("access request has been sent"));
    }

    // The pending link is disabled, so only the colleague's own customer is listed.
    let (_, body) = app
        .json(Method::GET, "/api/v1/me/companies", None, Some(&colleague.token))
        .await;
    let companies = body["companies"].as_array().unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0]["name"], colleague.customer_id.to_string());
}

#[tokio::test]
async fn gst_number_must_be_fifteen_characters() {
    let (app, _server) = app_with_gst_registry().await;
    let user = app.account("founder@example.com", "9000000504").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/gst/check",
            Some(json!({"gst_no": "27AAPFU"})),
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["validation_errors"][0]["field"], "gst_no");
}

#[tokio::test]
async fn gst_onboarding_without_a_registry_is_a_gateway_error() {
    let app = TestApp::new().await;
    let user = app.account("founder@example.com", "9000000505").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/gst",
            Some(json!({"gst_no": GSTIN})),
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn non_gst_onboarding_and_pending_requests() {
    let app = TestApp::new().await;
    let owner = app.account("owner@example.com", "9000000506").await;
    let partner = app.account("partner@example.com", "9000000507").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/non-gst/check",
            Some(json!({"mobile_no": "9876501234"})),
            Some(&owner.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "new_non_gst");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/non-gst",
            Some(json!({
                "company_name": "Sharma Hardware",
                "mobile_no": "9876501234",
                "address_line1": "Shop 4, Main Bazaar",
                "city": "Nashik",
                "pincode": "422001"
            })),
            Some(&owner.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "success");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/non-gst/check",
            Some(json!({"mobile_no": "9876501234"})),
            Some(&partner.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/onboarding/non-gst/check",
            Some(json!({"mobile_no": "98765"})),
            Some(&partner.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone number must be exactly 10 digits");
}

#[tokio::test]
async fn active_company_requires_an_enabled_link() {
    let app = TestApp::new().await;
    let user = app.account("buyer@example.com", "9000000508").await;
    let stranger = app.account("stranger@example.com", "9000000509").await;
    let own = user.customer_id.to_string();

    let (_, body) = app
        .json(Method::GET, "/api/v1/me/companies", None, Some(&user.token))
        .await;
    assert!(body["active_company"].is_null());

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/me/active-company",
            Some(json!({"company": own})),
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_company"], own.as_str());

    let (_, body) = app
        .json(Method::GET, "/api/v1/me/companies", None, Some(&user.token))
        .await;
    assert_eq!(body["active_company"], own.as_str());

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/me/active-company",
            Some(json!({"company": own})),
            Some(&stranger.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have access to this company");
}
