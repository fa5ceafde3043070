use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_and_customers::Migration),
            Box::new(m20240101_000002_create_addresses_and_carts::Migration),
            Box::new(m20240101_000003_create_catalog_tables::Migration),
            Box::new(m20240101_000004_create_sales_tables::Migration),
            Box::new(m20240101_000005_create_user_notifications_and_links::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_users_and_customers {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_users_and_customers"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::MobileNo).string().null().unique_key())
                        .col(ColumnDef::new(Users::FirstName).string().not_null())
                        .col(ColumnDef::new(Users::LastName).string().null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(ColumnDef::new(Users::UserImage).string().null())
                        .col(
                            ColumnDef::new(Users::Enabled)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Customers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Customers::CustomerName).string().not_null())
                        .col(
                            ColumnDef::new(Customers::CustomerType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::CustomerGroup).string().not_null())
                        .col(ColumnDef::new(Customers::Territory).string().not_null())
                        .col(ColumnDef::new(Customers::MobileNo).string().null())
                        .col(ColumnDef::new(Customers::EmailId).string().null())
                        .col(ColumnDef::new(Customers::TaxId).string().null())
                        .col(ColumnDef::new(Customers::UserId).uuid().null())
                        .col(
                            ColumnDef::new(Customers::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_customers_user_id")
                                .from(Customers::Table, Customers::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_user_id")
                        .table(Customers::Table)
                        .col(Customers::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_tax_id")
                        .table(Customers::Table)
                        .col(Customers::TaxId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_customers_customer_name")
                        .table(Customers::Table)
                        .col(Customers::CustomerName)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Email,
        Username,
        MobileNo,
        FirstName,
        LastName,
        PasswordHash,
        UserImage,
        Enabled,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        CustomerName,
        CustomerType,
        CustomerGroup,
        Territory,
        MobileNo,
        EmailId,
        TaxId,
        UserId,
        Disabled,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_addresses_and_carts {

    use super::m20240101_000001_create_users_and_customers::Customers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_addresses_and_carts"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Addresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Addresses::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Addresses::AddressTitle).string().not_null())
                        .col(ColumnDef::new(Addresses::AddressType).string().not_null())
                        .col(ColumnDef::new(Addresses::AddressLine1).string().not_null())
                        .col(ColumnDef::new(Addresses::AddressLine2).string().null())
                        .col(ColumnDef::new(Addresses::City).string().not_null())
                        .col(ColumnDef::new(Addresses::State).string().null())
                        .col(ColumnDef::new(Addresses::Country).string().not_null())
                        .col(ColumnDef::new(Addresses::Pincode).string().null())
                        .col(ColumnDef::new(Addresses::Phone).string().null())
                        .col(ColumnDef::new(Addresses::EmailId).string().null())
                        .col(
                            ColumnDef::new(Addresses::IsPrimaryAddress)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Addresses::IsShippingAddress)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Addresses::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Addresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Addresses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DynamicLinks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DynamicLinks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DynamicLinks::ParentType).string().not_null())
                        .col(ColumnDef::new(DynamicLinks::ParentId).string().not_null())
                        .col(ColumnDef::new(DynamicLinks::LinkDoctype).string().not_null())
                        .col(ColumnDef::new(DynamicLinks::LinkName).string().not_null())
                        .col(
                            ColumnDef::new(DynamicLinks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dynamic_links_parent")
                        .table(DynamicLinks::Table)
                        .col(DynamicLinks::ParentType)
                        .col(DynamicLinks::ParentId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dynamic_links_link")
                        .table(DynamicLinks::Table)
                        .col(DynamicLinks::LinkDoctype)
                        .col(DynamicLinks::LinkName)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShippingProcesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShippingProcesses::Name)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProcesses::ShippingProcess)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProcesses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProcesses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Name)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Warehouses::WarehouseName).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Warehouses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuickOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuickOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuickOrders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(QuickOrders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(QuickOrders::ShippingProcess).string().null())
                        .col(ColumnDef::new(QuickOrders::Warehouse).string().null())
                        .col(ColumnDef::new(QuickOrders::ShippingAddress).uuid().null())
                        .col(ColumnDef::new(QuickOrders::BillingAddress).uuid().null())
                        .col(
                            ColumnDef::new(QuickOrders::SubmittedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuickOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuickOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quick_orders_customer_id")
                                .from(QuickOrders::Table, QuickOrders::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quick_orders_customer_status")
                        .table(QuickOrders::Table)
                        .col(QuickOrders::CustomerId)
                        .col(QuickOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuickOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuickOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuickOrderItems::QuickOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuickOrderItems::ItemCode).string().not_null())
                        .col(ColumnDef::new(QuickOrderItems::ItemName).string().not_null())
                        .col(
                            ColumnDef::new(QuickOrderItems::Qty)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(QuickOrderItems::Uom).string().null())
                        .col(
                            ColumnDef::new(QuickOrderItems::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuickOrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quick_order_items_quick_order_id")
                                .from(QuickOrderItems::Table, QuickOrderItems::QuickOrderId)
                                .to(QuickOrders::Table, QuickOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuickOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuickOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ShippingProcesses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DynamicLinks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Addresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Addresses {
        Table,
        Id,
        AddressTitle,
        AddressType,
        AddressLine1,
        AddressLine2,
        City,
        State,
        Country,
        Pincode,
        Phone,
        EmailId,
        IsPrimaryAddress,
        IsShippingAddress,
        Disabled,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DynamicLinks {
        Table,
        Id,
        ParentType,
        ParentId,
        LinkDoctype,
        LinkName,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ShippingProcesses {
        Table,
        Name,
        ShippingProcess,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Name,
        WarehouseName,
        IsAvailable,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum QuickOrders {
        Table,
        Id,
        CustomerId,
        Status,
        ShippingProcess,
        Warehouse,
        ShippingAddress,
        BillingAddress,
        SubmittedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum QuickOrderItems {
        Table,
        Id,
        QuickOrderId,
        ItemCode,
        ItemName,
        Qty,
        Uom,
        Idx,
        CreatedAt,
    }
}

mod m20240101_000003_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Items::ItemCode)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Items::ItemName).string().not_null())
                        .col(ColumnDef::new(Items::Description).text().null())
                        .col(ColumnDef::new(Items::Image).string().null())
                        .col(ColumnDef::new(Items::ItemGroup).string().null())
                        .col(ColumnDef::new(Items::StockUom).string().null())
                        .col(
                            ColumnDef::new(Items::HasVariants)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Items::VariantOf).string().null())
                        .col(
                            ColumnDef::new(Items::Disabled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_variant_of")
                        .table(Items::Table)
                        .col(Items::VariantOf)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemVariantAttributes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemVariantAttributes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemVariantAttributes::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemVariantAttributes::Attribute)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemVariantAttributes::AttributeValue)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemVariantAttributes::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_variant_attributes_item_code")
                                .from(
                                    ItemVariantAttributes::Table,
                                    ItemVariantAttributes::ItemCode,
                                )
                                .to(Items::Table, Items::ItemCode)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WebsiteItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WebsiteItems::ItemCode)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WebsiteItems::WebItemName).string().not_null())
                        .col(ColumnDef::new(WebsiteItems::ItemGroup).string().null())
                        .col(ColumnDef::new(WebsiteItems::StockUom).string().null())
                        .col(
                            ColumnDef::new(WebsiteItems::Published)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(WebsiteItems::WebsiteImage).string().null())
                        .col(ColumnDef::new(WebsiteItems::ShortDescription).text().null())
                        .col(
                            ColumnDef::new(WebsiteItems::WebLongDescription)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WebsiteSpecifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WebsiteSpecifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteSpecifications::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteSpecifications::Label)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteSpecifications::Description)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WebsiteSpecifications::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemPrices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ItemPrices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ItemPrices::ItemCode).string().not_null())
                        .col(ColumnDef::new(ItemPrices::PriceList).string().not_null())
                        .col(
                            ColumnDef::new(ItemPrices::PriceListRate)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemPrices::Selling)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ItemPrices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_prices_item_code")
                        .table(ItemPrices::Table)
                        .col(ItemPrices::ItemCode)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemGroups::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemGroups::Name)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemGroups::ParentItemGroup).string().null())
                        .col(
                            ColumnDef::new(ItemGroups::IsGroup)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ItemGroups::Route).string().null())
                        .col(
                            ColumnDef::new(ItemGroups::ShowInWebsite)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HomepageHeaderImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HomepageHeaderImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HomepageHeaderImages::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HomepageHeaderImages::Image)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(HomepageHeaderImages::AltText).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HomepageCategoryProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HomepageCategoryProducts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HomepageCategoryProducts::Section)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(HomepageCategoryProducts::SectionIdx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HomepageCategoryProducts::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HomepageCategoryProducts::ItemCode)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TrackingSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TrackingSettings::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TrackingSettings::GaId).string().null())
                        .col(ColumnDef::new(TrackingSettings::MetaPixelId).string().null())
                        .col(
                            ColumnDef::new(TrackingSettings::EnableTracking)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TrackingSettings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(HomepageCategoryProducts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(HomepageHeaderImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemPrices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WebsiteSpecifications::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WebsiteItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemVariantAttributes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        ItemCode,
        ItemName,
        Description,
        Image,
        ItemGroup,
        StockUom,
        HasVariants,
        VariantOf,
        Disabled,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ItemVariantAttributes {
        Table,
        Id,
        ItemCode,
        Attribute,
        AttributeValue,
        Idx,
    }

    #[derive(DeriveIden)]
    enum WebsiteItems {
        Table,
        ItemCode,
        WebItemName,
        ItemGroup,
        StockUom,
        Published,
        WebsiteImage,
        ShortDescription,
        WebLongDescription,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WebsiteSpecifications {
        Table,
        Id,
        ItemCode,
        Label,
        Description,
        Idx,
    }

    #[derive(DeriveIden)]
    enum ItemPrices {
        Table,
        Id,
        ItemCode,
        PriceList,
        PriceListRate,
        Selling,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ItemGroups {
        Table,
        Name,
        ParentItemGroup,
        IsGroup,
        Route,
        ShowInWebsite,
    }

    #[derive(DeriveIden)]
    enum HomepageHeaderImages {
        Table,
        Id,
        Idx,
        Image,
        AltText,
    }

    #[derive(DeriveIden)]
    enum HomepageCategoryProducts {
        Table,
        Id,
        Section,
        SectionIdx,
        Idx,
        ItemCode,
    }

    #[derive(DeriveIden)]
    enum TrackingSettings {
        Table,
        Id,
        GaId,
        MetaPixelId,
        EnableTracking,
    }
}

mod m20240101_000004_create_sales_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Name)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::CompanyName).string().not_null())
                        .col(ColumnDef::new(Companies::TaxId).string().null())
                        .col(
                            ColumnDef::new(Companies::DefaultCurrency)
                                .string()
                                .not_null()
                                .default("INR"),
                        )
                        .col(ColumnDef::new(Companies::Email).string().null())
                        .col(ColumnDef::new(Companies::PhoneNo).string().null())
                        .col(
                            ColumnDef::new(Companies::GstRate)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Quotations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Quotations::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Quotations::QuotationNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Quotations::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::CustomerName).string().not_null())
                        .col(ColumnDef::new(Quotations::ContactEmail).string().null())
                        .col(ColumnDef::new(Quotations::ContactMobile).string().null())
                        .col(ColumnDef::new(Quotations::TaxId).string().null())
                        .col(ColumnDef::new(Quotations::Company).string().not_null())
                        .col(ColumnDef::new(Quotations::Currency).string().not_null())
                        .col(ColumnDef::new(Quotations::TransactionDate).date().not_null())
                        .col(ColumnDef::new(Quotations::ValidTill).date().not_null())
                        .col(ColumnDef::new(Quotations::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Quotations::Docstatus)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::NetTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::TotalTaxesAndCharges)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::GrandTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::RoundedTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Quotations::Notes).text().null())
                        .col(ColumnDef::new(Quotations::Terms).text().null())
                        .col(ColumnDef::new(Quotations::PaymentMethod).string().null())
                        .col(ColumnDef::new(Quotations::PaidDate).date().null())
                        .col(ColumnDef::new(Quotations::SalesOrderId).uuid().null())
                        .col(
                            ColumnDef::new(Quotations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotations_customer_id")
                        .table(Quotations::Table)
                        .col(Quotations::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotations_status")
                        .table(Quotations::Table)
                        .col(Quotations::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuotationItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationItems::QuotationId).uuid().not_null())
                        .col(ColumnDef::new(QuotationItems::ItemCode).string().not_null())
                        .col(ColumnDef::new(QuotationItems::ItemName).string().not_null())
                        .col(ColumnDef::new(QuotationItems::Description).text().null())
                        .col(ColumnDef::new(QuotationItems::Variant).string().null())
                        .col(
                            ColumnDef::new(QuotationItems::Qty)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::Rate)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationItems::Amount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationItems::Uom).string().not_null())
                        .col(ColumnDef::new(QuotationItems::Image).string().null())
                        .col(
                            ColumnDef::new(QuotationItems::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_items_quotation_id")
                                .from(QuotationItems::Table, QuotationItems::QuotationId)
                                .to(Quotations::Table, Quotations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuotationComments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationComments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationComments::QuotationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationComments::Content).text().not_null())
                        .col(
                            ColumnDef::new(QuotationComments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_comments_quotation_id")
                                .from(QuotationComments::Table, QuotationComments::QuotationId)
                                .to(Quotations::Table, Quotations::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SalesOrders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SalesOrders::QuotationId).uuid().null())
                        .col(ColumnDef::new(SalesOrders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(SalesOrders::CustomerName).string().not_null())
                        .col(ColumnDef::new(SalesOrders::Company).string().not_null())
                        .col(ColumnDef::new(SalesOrders::Currency).string().not_null())
                        .col(ColumnDef::new(SalesOrders::TransactionDate).date().not_null())
                        .col(ColumnDef::new(SalesOrders::DeliveryDate).date().not_null())
                        .col(ColumnDef::new(SalesOrders::Status).string_len(32).not_null())
                        .col(
                            ColumnDef::new(SalesOrders::NetTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::TotalTaxesAndCharges)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::GrandTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::RoundedTotal)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::SalesOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderItems::ItemCode).string().not_null())
                        .col(ColumnDef::new(SalesOrderItems::ItemName).string().not_null())
                        .col(ColumnDef::new(SalesOrderItems::Description).text().null())
                        .col(
                            ColumnDef::new(SalesOrderItems::Qty)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::Rate)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderItems::Amount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderItems::Uom).string().not_null())
                        .col(ColumnDef::new(SalesOrderItems::PrevdocQuotation).uuid().null())
                        .col(
                            ColumnDef::new(SalesOrderItems::Idx)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_order_items_sales_order_id")
                                .from(SalesOrderItems::Table, SalesOrderItems::SalesOrderId)
                                .to(SalesOrders::Table, SalesOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentEntries::PaymentType).string().not_null())
                        .col(ColumnDef::new(PaymentEntries::PartyId).uuid().not_null())
                        .col(ColumnDef::new(PaymentEntries::QuotationId).uuid().null())
                        .col(
                            ColumnDef::new(PaymentEntries::PaidAmount)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentEntries::ModeOfPayment)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentEntries::ReferenceNo).string().not_null())
                        .col(
                            ColumnDef::new(PaymentEntries::ReferenceDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payment_entries_quotation_id")
                        .table(PaymentEntries::Table)
                        .col(PaymentEntries::QuotationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuotationComments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QuotationItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Quotations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Companies {
        Table,
        Name,
        CompanyName,
        TaxId,
        DefaultCurrency,
        Email,
        PhoneNo,
        GstRate,
    }

    #[derive(DeriveIden)]
    enum Quotations {
        Table,
        Id,
        QuotationNumber,
        CustomerId,
        CustomerName,
        ContactEmail,
        ContactMobile,
        TaxId,
        Company,
        Currency,
        TransactionDate,
        ValidTill,
        Status,
        Docstatus,
        NetTotal,
        TotalTaxesAndCharges,
        GrandTotal,
        RoundedTotal,
        Notes,
        Terms,
        PaymentMethod,
        PaidDate,
        SalesOrderId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum QuotationItems {
        Table,
        Id,
        QuotationId,
        ItemCode,
        ItemName,
        Description,
        Variant,
        Qty,
        Rate,
        Amount,
        Uom,
        Image,
        Idx,
    }

    #[derive(DeriveIden)]
    enum QuotationComments {
        Table,
        Id,
        QuotationId,
        Content,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesOrders {
        Table,
        Id,
        OrderNumber,
        QuotationId,
        CustomerId,
        CustomerName,
        Company,
        Currency,
        TransactionDate,
        DeliveryDate,
        Status,
        NetTotal,
        TotalTaxesAndCharges,
        GrandTotal,
        RoundedTotal,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum SalesOrderItems {
        Table,
        Id,
        SalesOrderId,
        ItemCode,
        ItemName,
        Description,
        Qty,
        Rate,
        Amount,
        Uom,
        PrevdocQuotation,
        Idx,
    }

    #[derive(DeriveIden)]
    enum PaymentEntries {
        Table,
        Id,
        PaymentType,
        PartyId,
        QuotationId,
        PaidAmount,
        ModeOfPayment,
        ReferenceNo,
        ReferenceDate,
        CreatedAt,
    }
}

mod m20240101_000005_create_user_notifications_and_links {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_user_notifications_and_links"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UserNotifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserNotifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserNotifications::UserEmail)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserNotifications::Subject).string().not_null())
                        .col(ColumnDef::new(UserNotifications::Message).text().not_null())
                        .col(ColumnDef::new(UserNotifications::DocumentType).string().null())
                        .col(ColumnDef::new(UserNotifications::DocumentName).string().null())
                        .col(
                            ColumnDef::new(UserNotifications::IsRead)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UserNotifications::ReadAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(UserNotifications::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_user_notifications_user_email")
                        .table(UserNotifications::Table)
                        .col(UserNotifications::UserEmail)
                        .col(UserNotifications::IsRead)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserWebsiteLinks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserWebsiteLinks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserWebsiteLinks::UserEmail).string().not_null())
                        .col(
                            ColumnDef::new(UserWebsiteLinks::LinkDocumentType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserWebsiteLinks::LinkName).string().not_null())
                        .col(
                            ColumnDef::new(UserWebsiteLinks::RoleProfile)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserWebsiteLinks::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UserWebsiteLinks::IsDisable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(UserWebsiteLinks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserWebsiteLinks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_user_website_links_user_email")
                        .table(UserWebsiteLinks::Table)
                        .col(UserWebsiteLinks::UserEmail)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserWebsiteLinks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UserNotifications::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum UserNotifications {
        Table,
        Id,
        UserEmail,
        Subject,
        Message,
        DocumentType,
        DocumentName,
        IsRead,
        ReadAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum UserWebsiteLinks {
        Table,
        Id,
        UserEmail,
        LinkDocumentType,
        LinkName,
        RoleProfile,
        IsPrimary,
        IsDisable,
        CreatedAt,
        UpdatedAt,
    }
}

/// Connects to `db_url` and applies every pending migration.
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
