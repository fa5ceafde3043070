/// Company, quotation, sales order and payment entities
pub mod company;
pub mod payment_entry;
pub mod quotation;
pub mod quotation_comment;
pub mod quotation_item;
pub mod sales_order;
pub mod sales_order_item;

pub use company::{Entity as Company, Model as CompanyModel};
pub use payment_entry::{Entity as PaymentEntry, Model as PaymentEntryModel};
pub use quotation::{Entity as Quotation, Model as QuotationModel, QuotationStatus};
pub use quotation_comment::{Entity as QuotationComment, Model as QuotationCommentModel};
pub use quotation_item::{Entity as QuotationItem, Model as QuotationItemModel};
pub use sales_order::{Entity as SalesOrder, Model as SalesOrderModel, SalesOrderStatus};
pub use sales_order_item::{Entity as SalesOrderItem, Model as SalesOrderItemModel};
