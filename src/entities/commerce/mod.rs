/// Customer, address and cart entities
pub mod address;
pub mod customer;
pub mod dynamic_link;
pub mod quick_order;
pub mod quick_order_item;
pub mod shipping_process;
pub mod warehouse;

// Re-export entities
pub use address::{Entity as Address, Model as AddressModel};
pub use customer::{CustomerType, Entity as Customer, Model as CustomerModel};
pub use dynamic_link::{Entity as DynamicLink, Model as DynamicLinkModel};
pub use quick_order::{Entity as QuickOrder, Model as QuickOrderModel, QuickOrderStatus};
pub use quick_order_item::{Entity as QuickOrderItem, Model as QuickOrderItemModel};
pub use shipping_process::{Entity as ShippingProcess, Model as ShippingProcessModel};
pub use warehouse::{Entity as Warehouse, Model as WarehouseModel};
