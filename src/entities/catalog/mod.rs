/// Product catalogue and homepage entities
pub mod homepage_category_product;
pub mod homepage_header_image;
pub mod item;
pub mod item_group;
pub mod item_price;
pub mod item_variant_attribute;
pub mod tracking_settings;
pub mod website_item;
pub mod website_specification;

pub use homepage_category_product::{
    Entity as HomepageCategoryProduct, Model as HomepageCategoryProductModel,
};
pub use homepage_header_image::{Entity as HomepageHeaderImage, Model as HomepageHeaderImageModel};
pub use item::{Entity as Item, Model as ItemModel};
pub use item_group::{Entity as ItemGroup, Model as ItemGroupModel};
pub use item_price::{Entity as ItemPrice, Model as ItemPriceModel};
pub use item_variant_attribute::{
    Entity as ItemVariantAttribute, Model as ItemVariantAttributeModel,
};
pub use tracking_settings::{Entity as TrackingSettings, Model as TrackingSettingsModel};
pub use website_item::{Entity as WebsiteItem, Model as WebsiteItemModel};
pub use website_specification::{
    Entity as WebsiteSpecification, Model as WebsiteSpecificationModel,
};
