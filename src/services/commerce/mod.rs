/// Commerce services: customers, addresses, carts and the catalogue
pub mod address_service;
pub mod cart_service;
pub mod catalog_service;
pub mod customer_service;

pub use address_service::{AddressInput, AddressService, AddressSummary, AddressUpdate};
pub use cart_service::{CartItemInput, CartService, CartUpdate, CartView, ShippingProcessSummary};
pub use catalog_service::{CatalogService, HomepageData, ItemGroupNode, ProductDetail, TrackingKeys};
pub use customer_service::{CustomerService, NewCustomer};
