mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

fn office() -> Value {
    json!({
        "address_title": "Head Office",
        "address_line1": "12 Dock Road",
        "city": "Pune",
        "state": "Maharashtra",
        "pincode": "411001",
        "is_primary_address": true
    })
}

async fn create_address(app: &TestApp, customer: Uuid, token: &str, body: Value) -> Uuid {
    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/customers/{}/addresses", customer),
            Some(body),
            Some(token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["address_name"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("address id")
}

#[tokio::test]
async fn create_then_list_addresses() {
    let app = TestApp::new().await;
    let buyer = app.account("buyer@example.com", "9000000101").await;

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/customers/{}/addresses", buyer.customer_id),
            Some(office()),
            Some(&buyer.token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Address created successfully");
    let address_id = body["data"]["address_name"].as_str().unwrap().to_string();

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/customers/{}/addresses", buyer.customer_id),
            None,
            Some(&buyer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let addresses = body["data"].as_array().unwrap();
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0]["name"], address_id.as_str());
    assert_eq!(addresses[0]["city"], "Pune");
    assert_eq!(addresses[0]["address_type"], "Billing");
    assert_eq!(addresses[0]["country"], "India");
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let app = TestApp::new().await;
    let buyer = app.account("buyer@example.com", "9000000102").await;

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/customers/{}/addresses", buyer.customer_id),
            Some(json!({"address_title": "Depot", "address_line1": "", "city": "Pune"})),
            Some(&buyer.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn update_and_delete_an_address() {
    let app = TestApp::new().await;
    let buyer = app.account("buyer@example.com", "9000000103").await;
    let address = create_address(&app, buyer.customer_id, &buyer.token, office()).await;
    let path = format!("/api/v1/customers/{}/addresses/{}", buyer.customer_id, address);

    let (status, body) = app
        .json(Method::PUT, &path, Some(json!({"city": "Mumbai"})), Some(&buyer.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Address updated successfully");
    assert_eq!(body["data"]["city"], "Mumbai");
    assert_eq!(body["data"]["address_title"], "Head Office");

    let (status, _) = app
        .json(Method::PUT, &path, Some(json!({})), Some(&buyer.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.json(Method::DELETE, &path, None, Some(&buyer.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Address deleted successfully");

    let (_, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/customers/{}/addresses", buyer.customer_id),
            None,
            Some(&buyer.token),
        )
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn other_customers_addresses_are_off_limits() {
    let app = TestApp::new().await;
    let owner = app.account("owner@example.com", "9000000104").await;
    let stranger = app.account("stranger@example.com", "9000000105").await;
    let address = create_address(&app, owner.customer_id, &owner.token, office()).await;

    // Listing someone else's customer.
    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/customers/{}/addresses", owner.customer_id),
            None,
            Some(&stranger.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "You do not have access to this customer");

    // Reading the address directly.
    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/addresses/{}", address),
            None,
            Some(&stranger.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Address not found or unauthorized");

    // Editing it through the stranger's own customer.
    let (status, body) = app
        .json(
            Method::PUT,
            &format!(
                "/api/v1/customers/{}/addresses/{}",
                stranger.customer_id, address
            ),
            Some(json!({"city": "Nowhere"})),
            Some(&stranger.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Address not found or unauthorized");

    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/addresses/{}", address),
            None,
            Some(&owner.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["city"], "Pune");
}

#[tokio::test]
async fn unknown_and_foreign_addresses_look_the_same() {
    let app = TestApp::new().await;
    let owner = app.account("holder@example.com", "9000000107").await;
    let stranger = app.account("outsider@example.com", "9000000108").await;
    let address = create_address(&app, owner.customer_id, &owner.token, office()).await;
    let missing = Uuid::new_v4();

    for id in [address, missing] {
        let (status, body) = app
            .json(
                Method::GET,
                &format!("/api/v1/addresses/{}", id),
                None,
                Some(&stranger.token),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
        assert_eq!(body["error"], "Address not found or unauthorized");

        let (status, body) = app
            .json(
                Method::POST,
                &format!("/api/v1/addresses/{}/links", id),
                Some(json!({"link_doctype": "Customer", "link_name": stranger.customer_id.to_string()})),
                Some(&stranger.token),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
        assert_eq!(body["error"], "Address not found or unauthorized");
    }
}

#[tokio::test]
async fn linking_an_address_to_another_owned_customer() {
    let app = TestApp::new().await;
    let buyer = app.account("buyer@example.com", "9000000106").await;
    let address = create_address(&app, buyer.customer_id, &buyer.token, office()).await;

    // Second customer the same user administers.
    let second = storefront_api::services::commerce::customer_service::insert_customer(
        &*app.state.db,
        storefront_api::services::commerce::NewCustomer::new(
            "Branch Office",
            storefront_api::entities::commerce::customer::CustomerType::Company,
            "Commercial",
        ),
    )
    .await
    .unwrap();
    storefront_api::services::commerce::customer_service::insert_customer_link(
        &*app.state.db,
        &buyer.email,
        second.id,
        "Admin",
        false,
        false,
    )
    .await
    .unwrap();

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/addresses/{}/links", address),
            Some(json!({"link_doctype": "Customer", "link_name": second.id.to_string()})),
            Some(&buyer.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/customers/{}/addresses", second.id),
            None,
            Some(&buyer.token),
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
