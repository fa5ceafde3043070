//! Seed data script - populates the database with a small demo storefront
//!
//! Run with: cargo run --bin seed-data -- --migrate
//!
//! This creates:
//! - one selling company with an 18% GST rate
//! - an item group tree, six items (one template with two variants) and prices
//! - homepage sections, header images and tracking keys
//! - shipping processes and a warehouse
//! - a demo user linked to a demo customer

use chrono::Utc;
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::time::Duration as StdDuration;
use tracing::info;
use uuid::Uuid;

use storefront_api::{
    auth::user,
    entities::{
        catalog::{
            homepage_category_product, homepage_header_image, item,
            item_group::{self, ROOT_ITEM_GROUP},
            item_price,
            item_variant_attribute, tracking_settings, website_item, website_specification,
        },
        commerce::{customer::CustomerType, shipping_process, warehouse},
        sales::company,
    },
    services::{
        accounts::hash_password,
        commerce::{
            customer_service::{insert_customer, insert_customer_link},
            NewCustomer,
        },
    },
};

const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the storefront database with demo data")]
struct Args {
    /// Database URL; falls back to DATABASE_URL, then a local SQLite file
    #[arg(long)]
    database_url: Option<String>,

    /// Run migrations before seeding
    #[arg(long)]
    migrate: bool,

    #[arg(long, default_value = "demo@storefront.local")]
    demo_email: String,

    #[arg(long, default_value = "9876543210")]
    demo_mobile: String,

    #[arg(long, default_value = "DemoPass123")]
    demo_password: String,
}

struct SeedItem {
    code: &'static str,
    name: &'static str,
    group: &'static str,
    price: Decimal,
    variant_of: Option<&'static str>,
    has_variants: bool,
}

const ITEM_GROUPS: &[(&str, Option<&str>, bool)] = &[
    (ROOT_ITEM_GROUP, None, true),
    ("Fasteners", Some(ROOT_ITEM_GROUP), true),
    ("Bolts", Some("Fasteners"), false),
    ("Tools", Some(ROOT_ITEM_GROUP), false),
];

fn catalogue() -> Vec<SeedItem> {
    vec![
        SeedItem {
            code: "BOLT-M8",
            name: "Hex Bolt M8",
            group: "Bolts",
            price: dec!(12.50),
            variant_of: None,
            has_variants: true,
        },
        SeedItem {
            code: "BOLT-M8-ZINC",
            name: "Hex Bolt M8 Zinc",
            group: "Bolts",
            price: dec!(13.75),
            variant_of: Some("BOLT-M8"),
            has_variants: false,
        },
        SeedItem {
            code: "BOLT-M8-SS",
            name: "Hex Bolt M8 Stainless",
            group: "Bolts",
            price: dec!(21.00),
            variant_of: Some("BOLT-M8"),
            has_variants: false,
        },
        SeedItem {
            code: "WASHER-8",
            name: "Flat Washer 8mm",
            group: "Fasteners",
            price: dec!(1.20),
            variant_of: None,
            has_variants: false,
        },
        SeedItem {
            code: "SPANNER-13",
            name: "Combination Spanner 13mm",
            group: "Tools",
            price: dec!(349.00),
            variant_of: None,
            has_variants: false,
        },
        SeedItem {
            code: "DRILL-500",
            name: "Impact Drill 500W",
            group: "Tools",
            price: dec!(2899.00),
            variant_of: None,
            has_variants: false,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
    let args = Args::parse();

    let database_url = args
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;

    if args.migrate {
        storefront_api::db::run_migrations(&db).await?;
    }

    seed_company(&db).await?;
    info!("Created company");

    let items = seed_catalogue(&db).await?;
    info!("Created {} items", items);

    seed_homepage(&db).await?;
    info!("Created homepage sections, header images and tracking keys");

    seed_logistics(&db).await?;
    info!("Created shipping processes and warehouse");

    let customer_id = seed_demo_account(&db, &args).await?;
    info!(
        "Demo user {} can act for customer {}",
        args.demo_email, customer_id
    );

    info!("Seeding complete");
    Ok(())
}

async fn seed_company(db: &DatabaseConnection) -> anyhow::Result<()> {
    company::ActiveModel {
        name: Set("Storefront Traders".to_string()),
        company_name: Set("Storefront Traders Pvt Ltd".to_string()),
        tax_id: Set(Some("27AAACS1234F1Z5".to_string())),
        default_currency: Set("INR".to_string()),
        email: Set(Some("sales@storefront.local".to_string())),
        phone_no: Set(Some("02212345678".to_string())),
        gst_rate: Set(dec!(0.18)),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_catalogue(db: &DatabaseConnection) -> anyhow::Result<usize> {
    let now = Utc::now();

    for (name, parent, is_group) in ITEM_GROUPS {
        item_group::ActiveModel {
            name: Set(name.to_string()),
            parent_item_group: Set(parent.map(str::to_string)),
            is_group: Set(*is_group),
            route: Set(Some(name.to_lowercase().replace(' ', "-"))),
            show_in_website: Set(*name != ROOT_ITEM_GROUP),
        }
        .insert(db)
        .await?;
    }

    let items = catalogue();
    for seed in &items {
        item::ActiveModel {
            item_code: Set(seed.code.to_string()),
            item_name: Set(seed.name.to_string()),
            description: Set(Some(format!("{} for industrial use", seed.name))),
            image: Set(Some(format!("/files/{}.jpg", seed.code.to_lowercase()))),
            item_group: Set(Some(seed.group.to_string())),
            stock_uom: Set(Some("Nos".to_string())),
            has_variants: Set(seed.has_variants),
            variant_of: Set(seed.variant_of.map(str::to_string)),
            disabled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        website_item::ActiveModel {
            item_code: Set(seed.code.to_string()),
            web_item_name: Set(seed.name.to_string()),
            item_group: Set(Some(seed.group.to_string())),
            stock_uom: Set(Some("Nos".to_string())),
            published: Set(true),
            website_image: Set(None),
            short_description: Set(Some(seed.name.to_string())),
            web_long_description: Set(Some(format!("<p>{}</p>", seed.name))),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        item_price::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set(seed.code.to_string()),
            price_list: Set("Standard Selling".to_string()),
            price_list_rate: Set(seed.price),
            selling: Set(true),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    for (idx, (code, finish)) in [("BOLT-M8-ZINC", "Zinc"), ("BOLT-M8-SS", "Stainless")]
        .into_iter()
        .enumerate()
    {
        item_variant_attribute::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_code: Set(code.to_string()),
            attribute: Set("Finish".to_string()),
            attribute_value: Set(finish.to_string()),
            idx: Set(idx as i32),
        }
        .insert(db)
        .await?;
    }

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
        .insert(db)
        .await?;
    }

    Ok(items.len())
}

async fn seed_homepage(db: &DatabaseConnection) -> anyhow::Result<()> {
    let sections: [(&str, &[&str]); 2] = [
        ("Best Sellers", &["BOLT-M8", "WASHER-8"]),
        ("Tools", &["SPANNER-13", "DRILL-500"]),
    ];
    for (section_idx, (section, codes)) in sections.into_iter().enumerate() {
        for (idx, code) in codes.iter().enumerate() {
            homepage_category_product::ActiveModel {
                id: Set(Uuid::new_v4()),
                section: Set(section.to_string()),
                section_idx: Set(section_idx as i32),
                idx: Set(idx as i32),
                item_code: Set(code.to_string()),
            }
            .insert(db)
            .await?;
        }
    }

    for idx in 0..2 {
        homepage_header_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            idx: Set(idx),
            image: Set(format!("/files/banner-{}.jpg", idx + 1)),
            alt_text: Set(Some(format!("Banner {}", idx + 1))),
        }
        .insert(db)
        .await?;
    }

    tracking_settings::ActiveModel {
        id: Set(1),
        ga_id: Set(Some("G-DEMO000000".to_string())),
        meta_pixel_id: Set(None),
        enable_tracking: Set(true),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_logistics(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now();
    for name in ["Standard Delivery", "Express Delivery", "Self Pickup"] {
        shipping_process::ActiveModel {
            name: Set(name.to_string()),
            shipping_process: Set(name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }

    warehouse::ActiveModel {
        name: Set("Stores - ST".to_string()),
        warehouse_name: Set("Stores".to_string()),
        is_available: Set(true),
        created_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_demo_account(db: &DatabaseConnection, args: &Args) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let user_id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(user_id),
        email: Set(args.demo_email.clone()),
        username: Set(args.demo_email.clone()),
        mobile_no: Set(Some(args.demo_mobile.clone())),
        first_name: Set("Demo".to_string()),
        last_name: Set(Some("Buyer".to_string())),
        password_hash: Set(hash_password(&args.demo_password)?),
        user_image: Set(None),
        enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    let mut customer = NewCustomer::new("Demo Buyer", CustomerType::Individual, "Individual");
    customer.mobile_no = Some(args.demo_mobile.clone());
    customer.email_id = Some(args.demo_email.clone());
    customer.user_id = Some(user_id);
    let customer = insert_customer(db, customer).await?;
    insert_customer_link(db, &args.demo_email, customer.id, "Admin", true, false).await?;

    Ok(customer.id)
}
