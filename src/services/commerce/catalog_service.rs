use crate::{
    entities::catalog::{
        homepage_category_product, homepage_header_image, item, item_group::ROOT_ITEM_GROUP,
        item_group, item_price, item_variant_attribute, tracking_settings::SETTINGS_ID,
        website_specification, HomepageCategoryProduct, HomepageHeaderImage, Item, ItemGroup,
        ItemGroupModel, ItemPrice, ItemVariantAttribute, TrackingSettings, WebsiteItem,
        WebsiteSpecification,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

const DEFAULT_UOM: &str = "Nos";
const PLACEHOLDER_IMAGE: &str = "/placeholder-product.jpg";
const OTHER_GROUP: &str = "Other";
const OTHER_ROUTE: &str = "other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub item_code: String,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub attributes: Vec<VariantAttribute>,
}

/// Product page payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub item_code: String,
    pub name: String,
    pub image: String,
    pub item_group: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub uom: String,
    pub short_description: String,
    pub description: String,
    pub highlights: Vec<Highlight>,
    pub has_variants: bool,
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroupNode {
    pub name: String,
    pub route: Option<String>,
    pub children: Vec<ItemGroupNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderImage {
    pub idx: i32,
    pub image: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomepageProduct {
    pub item_code: String,
    pub name: String,
    pub image: String,
    pub item_group: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub uom: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomepageCategory {
    pub name: String,
    pub products: Vec<HomepageProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomepageData {
    pub header: Vec<HeaderImage>,
    pub categories: Vec<HomepageCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingKeys {
    pub ga_id: Option<String>,
    pub meta_pixel_id: Option<String>,
    pub enable_tracking: bool,
}

/// Builds the storefront navigation tree from website-visible groups.
///
/// Roots are group nodes directly under the root group. Leaf groups hanging
/// off the root that no root claims are collected under a synthetic "Other".
pub fn build_item_group_tree(mut groups: Vec<ItemGroupModel>) -> Vec<ItemGroupNode> {
    groups.sort_by(|a, b| a.name.cmp(&b.name));

    fn children_of(
        groups: &[ItemGroupModel],
        parent: &str,
        included: &mut HashSet<String>,
    ) -> Vec<ItemGroupNode> {
        let mut nodes = Vec::new();
        for group in groups {
            if group.parent_item_group.as_deref() != Some(parent) {
                continue;
            }
            // A group reached twice means a cycle in the parent chain.
            if !included.insert(group.name.clone()) {
                continue;
            }
            nodes.push(ItemGroupNode {
                name: group.name.clone(),
                route: group.route.clone(),
                children: children_of(groups, &group.name, included),
            });
        }
        nodes
    }

    let mut included = HashSet::new();
    let mut tree = Vec::new();

    for group in &groups {
        if group.is_group && group.parent_item_group.as_deref() == Some(ROOT_ITEM_GROUP) {
            included.insert(group.name.clone());
            tree.push(ItemGroupNode {
                name: group.name.clone(),
                route: group.route.clone(),
                children: children_of(&groups, &group.name, &mut included),
            });
        }
    }

    let orphans: Vec<ItemGroupNode> = groups
        .iter()
        .filter(|g| {
            !g.is_group
                && g.parent_item_group.as_deref() == Some(ROOT_ITEM_GROUP)
                && !included.contains(&g.name)
        })
        .map(|g| ItemGroupNode {
            name: g.name.clone(),
            route: g.route.clone(),
            children: Vec::new(),
        })
        .collect();

    if !orphans.is_empty() {
        tree.push(ItemGroupNode {
            name: OTHER_GROUP.to_string(),
            route: Some(OTHER_ROUTE.to_string()),
            children: orphans,
        });
    }

    tree
}

/// Read-only catalogue queries for product pages, navigation and the homepage.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Latest selling price, zero when none is set.
    pub async fn selling_price(&self, item_code: &str) -> Result<Decimal, ServiceError> {
        Ok(ItemPrice::find()
            .filter(item_price::Column::ItemCode.eq(item_code))
            .filter(item_price::Column::Selling.eq(true))
            .order_by_desc(item_price::Column::UpdatedAt)
            .one(&*self.db)
            .await?
            .map(|p| p.price_list_rate)
            .unwrap_or(Decimal::ZERO))
    }

    #[instrument(skip(self))]
    pub async fn get_product_detail(&self, item_code: &str) -> Result<ProductDetail, ServiceError> {
        let item_code = item_code.trim();
        if item_code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Item code is required".to_string(),
            ));
        }

        let listing = WebsiteItem::find_by_id(item_code.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found".to_string()))?;
        if !listing.published {
            return Err(ServiceError::NotFound("Item not published".to_string()));
        }

        let price = self.selling_price(&listing.item_code).await?;
        let highlights = WebsiteSpecification::find()
            .filter(website_specification::Column::ItemCode.eq(listing.item_code.as_str()))
            .order_by_asc(website_specification::Column::Idx)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|spec| Highlight {
                label: spec.label,
                description: spec.description,
            })
            .collect();

        let master = Item::find_by_id(listing.item_code.clone())
            .one(&*self.db)
            .await?;
        let has_variants = master.as_ref().map_or(false, |m| m.has_variants);
        let image = listing
            .website_image
            .clone()
            .filter(|i| !i.is_empty())
            .or_else(|| master.as_ref().and_then(|m| m.image.clone()))
            .unwrap_or_default();

        let variants = if has_variants {
            self.published_variants(&listing.item_code).await?
        } else {
            Vec::new()
        };

        Ok(ProductDetail {
            item_code: listing.item_code,
            name: listing.web_item_name,
            image,
            item_group: listing.item_group.unwrap_or_default(),
            price,
            uom: listing.stock_uom.unwrap_or_else(|| DEFAULT_UOM.to_string()),
            short_description: listing.short_description.unwrap_or_default(),
            description: listing.web_long_description.unwrap_or_default(),
            highlights,
            has_variants,
            variants,
        })
    }

    /// Enabled variants of `template` whose own listing is published.
    async fn published_variants(&self, template: &str) -> Result<Vec<ProductVariant>, ServiceError> {
        let variant_items = Item::find()
            .filter(item::Column::VariantOf.eq(template))
            .filter(item::Column::Disabled.eq(false))
            .order_by_asc(item::Column::ItemCode)
            .all(&*self.db)
            .await?;

        let mut variants = Vec::new();
        for variant in variant_items {
            let Some(listing) = WebsiteItem::find_by_id(variant.item_code.clone())
                .one(&*self.db)
                .await?
            else {
                continue;
            };
            if !listing.published {
                continue;
            }

            let attributes = ItemVariantAttribute::find()
                .filter(item_variant_attribute::Column::ItemCode.eq(variant.item_code.as_str()))
                .order_by_asc(item_variant_attribute::Column::Idx)
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|attr| VariantAttribute {
                    attribute: attr.attribute,
                    value: attr.attribute_value,
                })
                .collect();

            let price = self.selling_price(&variant.item_code).await?;
            let image = listing
                .website_image
                .filter(|i| !i.is_empty())
                .or(variant.image)
                .unwrap_or_default();

            variants.push(ProductVariant {
                item_code: variant.item_code,
                item_name: variant.item_name,
                price,
                image,
                attributes,
            });
        }

        Ok(variants)
    }

    #[instrument(skip(self))]
    pub async fn get_item_groups(&self) -> Result<Vec<ItemGroupNode>, ServiceError> {
        let groups = ItemGroup::find()
            .filter(item_group::Column::ShowInWebsite.eq(true))
            .order_by_asc(item_group::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(build_item_group_tree(groups))
    }

    pub async fn get_homepage_header(&self) -> Result<Vec<HeaderImage>, ServiceError> {
        Ok(HomepageHeaderImage::find()
            .order_by_asc(homepage_header_image::Column::Idx)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|row| HeaderImage {
                idx: row.idx,
                image: row.image,
                alt_text: row.alt_text,
            })
            .collect())
    }

    /// Category sections in configured order; slots naming unknown items are skipped.
    #[instrument(skip(self))]
    pub async fn get_homepage_products(&self) -> Result<Vec<HomepageCategory>, ServiceError> {
        let slots = HomepageCategoryProduct::find()
            .order_by_asc(homepage_category_product::Column::SectionIdx)
            .order_by_asc(homepage_category_product::Column::Idx)
            .all(&*self.db)
            .await?;

        let mut categories: Vec<HomepageCategory> = Vec::new();
        for slot in slots {
            let Some(item) = Item::find_by_id(slot.item_code.clone())
                .one(&*self.db)
                .await?
            else {
                continue;
            };
            let price = self.selling_price(&item.item_code).await?;
            let product = HomepageProduct {
                item_code: item.item_code,
                name: item.item_name,
                image: item
                    .image
                    .filter(|i| !i.is_empty())
                    .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
                item_group: slot.section.clone(),
                price,
                uom: item.stock_uom.unwrap_or_else(|| DEFAULT_UOM.to_string()),
                description: item.description.unwrap_or_default(),
            };

            match categories.iter_mut().find(|c| c.name == slot.section) {
                Some(category) => category.products.push(product),
                None => categories.push(HomepageCategory {
                    name: slot.section,
                    products: vec![product],
                }),
            }
        }

        Ok(categories)
    }

    pub async fn get_homepage_data(&self) -> Result<HomepageData, ServiceError> {
        Ok(HomepageData {
            header: self.get_homepage_header().await?,
            categories: self.get_homepage_products().await?,
        })
    }

    pub async fn get_tracking_keys(&self) -> Result<TrackingKeys, ServiceError> {
        let settings = TrackingSettings::find_by_id(SETTINGS_ID)
            .one(&*self.db)
            .await?;
        Ok(match settings {
            Some(s) => TrackingKeys {
                ga_id: s.ga_id,
                meta_pixel_id: s.meta_pixel_id,
                enable_tracking: s.enable_tracking,
            },
            None => TrackingKeys {
                ga_id: None,
                meta_pixel_id: None,
                enable_tracking: false,
            },
        })
    }
}
