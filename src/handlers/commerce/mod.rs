//! Storefront commerce handlers: the Quick Order cart and catalogue reads.

pub mod carts;
pub mod products;

pub use carts::cart_routes;
pub use products::catalog_routes;
