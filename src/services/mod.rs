// Accounts, OTP flows and tokens
pub mod accounts;

// Customers, addresses, carts and the catalogue
pub mod commerce;

// Quotations through to sales orders and payments
pub mod quotations;

// In-app notifications
pub mod notifications;

// Company links and business onboarding
pub mod company_links;
pub mod gst;
