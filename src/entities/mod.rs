//! Database entities, grouped by the part of the storefront that owns them.

pub mod catalog;
pub mod commerce;
pub mod sales;
pub mod user_notification;
pub mod user_website_link;

pub use crate::auth::user::{Entity as User, Model as UserModel};
pub use user_notification::{Entity as UserNotification, Model as UserNotificationModel};
pub use user_website_link::{Entity as UserWebsiteLink, Model as UserWebsiteLinkModel};
