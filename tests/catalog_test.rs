mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::entities::catalog::{
    homepage_category_product, homepage_header_image, item, item_group,
    item_group::ROOT_ITEM_GROUP, item_variant_attribute, tracking_settings, website_item,
    website_specification,
};
use uuid::Uuid;

async fn seed_groups(app: &TestApp) {
    for (name, parent, is_group) in [
        ("Fasteners", ROOT_ITEM_GROUP, true),
        ("Bolts", "Fasteners", false),
        ("Paint", ROOT_ITEM_GROUP, false),
    ] {
        item_group::ActiveModel {
            name: Set(name.to_string()),
            parent_item_group: Set(Some(parent.to_string())),
            is_group: Set(is_group),
            route: Set(Some(name.to_lowercase())),
            show_in_website: Set(true),
        }
        .insert(&*app.state.db)
        .await
        .unwrap();
    }
}

/// Template BOLT-M8 with a published zinc variant and an unpublished stainless one.
async fn seed_template(app: &TestApp) {
    app.seed_item("BOLT-M8", "Hex Bolt M8", dec!(12.50), true).await;
    app.seed_item("BOLT-M8-ZINC", "Hex Bolt M8 Zinc", dec!(13.75), true).await;
    app.seed_item("BOLT-M8-SS", "Hex Bolt M8 Stainless", dec!(21.00), false).await;

    let template = item::Entity::find_by_id("BOLT-M8".to_string())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut template: item::ActiveModel = template.into();
    template.has_variants = Set(true);
    template.update(&*app.state.db).await.unwrap();

    for code in ["BOLT-M8-ZINC", "BOLT-M8-SS"] {
        let variant = item::Entity::find_by_id(code.to_string())
            .one(&*app.state.db)
            .await
            .unwrap()
            .unwrap();
        let mut variant: item::ActiveModel = variant.into();
        variant.variant_of = Set(Some("BOLT-M8".to_string()));
        variant.update(&*app.state.db).await.unwrap();
    }

    item_variant_attribute::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_code: Set("BOLT-M8-ZINC".to_string()),
        attribute: Set("Finish".to_string()),
        attribute_value: Set("Zinc".to_string()),
        idx: Set(0),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    for (idx, (label, description)) in [("Thread", "M8 x 1.25"), ("Grade", "8.8")]
        .into_iter()
        .enumerate()
    {
        website_specification::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set("BOLT-M8".to_string()),
            label: Set(label.to_string()),
            description: Set(description.to_string()),
            idx: Set(idx as i32),
        }
        .insert(&*app.state.db)
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn product_page_lists_published_variants() {
    let app = TestApp::new().await;
    seed_template(&app).await;

    let (status, body) = app
        .json(Method::GET, "/api/v1/products/BOLT-M8", None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let product = &body["data"];
    assert_eq!(product["name"], "Hex Bolt M8");
    assert_eq!(product["price"], 12.5);
    assert_eq!(product["has_variants"], true);
    assert_eq!(product["image"], "/files/bolt-m8.jpg");
    assert_eq!(product["highlights"][0]["label"], "Thread");
    assert_eq!(product["highlights"][1]["description"], "8.8");

    let variants = product["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0]["item_code"], "BOLT-M8-ZINC");
    assert_eq!(variants[0]["price"], 13.75);
    assert_eq!(variants[0]["attributes"][0]["value"], "Zinc");
}

#[tokio::test]
async fn unknown_and_unpublished_products_are_not_found() {
    let app = TestApp::new().await;
    seed_template(&app).await;

    let (status, body) = app
        .json(Method::GET, "/api/v1/products/NOPE", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Item not found");

    let (status, body) = app
        .json(Method::GET, "/api/v1/products/BOLT-M8-SS", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item not published");
}

#[tokio::test]
async fn item_groups_collect_loose_leaves_under_other() {
    let app = TestApp::new().await;
    seed_groups(&app).await;

    let (status, body) = app.json(Method::GET, "/api/v1/item-groups", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let tree = body["data"].as_array().unwrap();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0]["name"], "Fasteners");
    assert_eq!(tree[0]["children"][0]["name"], "Bolts");
    assert_eq!(tree[1]["name"], "Other");
    assert_eq!(tree[1]["route"], "other");
    assert_eq!(tree[1]["children"][0]["name"], "Paint");
}

#[tokio::test]
async fn homepage_sections_and_tracking_keys() {
    let app = TestApp::new().await;
    app.seed_item("DRILL-500", "Impact Drill 500W", dec!(2899), true).await;

    for (idx, code) in ["DRILL-500", "MISSING-ITEM"].into_iter().enumerate() {
        homepage_category_product::ActiveModel {
            id: Set(Uuid::new_v4()),
            section: Set("Tools".to_string()),
            section_idx: Set(0),
            idx: Set(idx as i32),
            item_code: Set(code.to_string()),
        }
        .insert(&*app.state.db)
        .await
        .unwrap();
    }
    homepage_header_image::ActiveModel {
        id: Set(Uuid::new_v4()),
        idx: Set(0),
        image: Set("/files/banner-1.jpg".to_string()),
        alt_text: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();
    tracking_settings::ActiveModel {
        id: Set(1),
        ga_id: Set(Some("G-TEST".to_string())),
        meta_pixel_id: Set(None),
        enable_tracking: Set(true),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    let (status, body) = app
        .json(Method::GET, "/api/v1/homepage/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Tools");
    // Slots naming unknown items are skipped.
    let products = categories[0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["price"], 2899.0);

    let (_, body) = app.json(Method::GET, "/api/v1/homepage", None, None).await;
    assert_eq!(body["data"]["header"][0]["image"], "/files/banner-1.jpg");
    assert_eq!(body["data"]["categories"][0]["name"], "Tools");

    let (_, body) = app
        .json(Method::GET, "/api/v1/tracking-keys", None, None)
        .await;
    assert_eq!(body["data"]["ga_id"], "G-TEST");
    assert_eq!(body["data"]["enable_tracking"], true);
}

#[tokio::test]
async fn website_listing_name_is_used_on_product_pages() {
    let app = TestApp::new().await;
    app.seed_item("SPANNER-13", "Spanner", dec!(349), true).await;

    let listing = website_item::Entity::find_by_id("SPANNER-13".to_string())
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut listing: website_item::ActiveModel = listing.into();
    listing.web_item_name = Set("Combination Spanner 13mm".to_string());
    listing.updated_at = Set(Utc::now());
    listing.update(&*app.state.db).await.unwrap();

    let (_, body) = app
        .json(Method::GET, "/api/v1/products/SPANNER-13", None, None)
        .await;
    assert_eq!(body["data"]["name"], "Combination Spanner 13mm");
    assert_eq!(body["data"]["uom"], "Nos");
}
