use crate::{
    entities::{
        catalog::{item, Item, WebsiteItem},
        commerce::{
            customer::{self, CustomerType, COMMERCIAL_GROUP},
            Customer, CustomerModel,
        },
        sales::{
            payment_entry, quotation, quotation_comment, quotation_item, sales_order,
            sales_order_item, Company, CompanyModel, Quotation, QuotationComment, QuotationItem,
            QuotationItemModel, QuotationModel, QuotationStatus, SalesOrderModel,
            SalesOrderStatus,
        },
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::{
        address_service::{insert_customer_address, AddressInput},
        customer_service::{insert_customer, NewCustomer},
    },
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_VALIDITY_DAYS: u64 = 15;
const DEFAULT_DELIVERY_DAYS: u64 = 7;
const DEFAULT_UOM: &str = "Nos";
const DEFAULT_ITEM_GROUP: &str = "Products";
const OFFICE_ADDRESS_TYPE: &str = "Office";
const OFFICE_ADDRESS_CITY: &str = "Mumbai";
const PAYMENT_REFERENCE_LENGTH: usize = 12;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;
const TREND_MONTHS: u32 = 6;
const TOP_CUSTOMERS: usize = 5;

fn document_number(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, id[..8].to_uppercase())
}

fn payment_reference() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PAYMENT_REFERENCE_LENGTH)
        .map(char::from)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::ValidationError(format!("Missing required field: {}", field)))
}

/// Net, tax, grand and rounded totals for a set of line amounts.
pub fn compute_totals(amounts: &[Decimal], gst_rate: Decimal) -> (Decimal, Decimal, Decimal, Decimal) {
    let net: Decimal = amounts.iter().copied().sum();
    let taxes = (net * gst_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let grand = net + taxes;
    let rounded = grand.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (net, taxes, grand, rounded)
}

/// Subtotal, gst and total as shown to the storefront.
fn resolve_totals(quotation: &QuotationModel) -> (Decimal, Decimal, Decimal) {
    let subtotal = quotation.net_total;
    let total = if quotation.grand_total.is_zero() {
        quotation.rounded_total
    } else {
        quotation.grand_total
    };
    (subtotal, total - subtotal, total)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuotationItemInput {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub variant: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateQuotationInput {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_company: Option<String>,
    pub customer_gst: Option<String>,
    pub company: Option<String>,
    pub items: Option<Vec<QuotationItemInput>>,
    pub created_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EditQuotationInput {
    pub quotation_id: Option<Uuid>,
    pub quotation_number: Option<String>,
    pub status: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_gst: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotationCreated {
    pub id: Uuid,
    pub quotation_number: String,
    pub status: String,
    pub created_date: NaiveDate,
    pub valid_until: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyView {
    pub name: String,
    pub gst: Option<String>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotationLineView {
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub image: String,
}

/// Quotation as listed; details add notes and terms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotationView {
    pub id: Uuid,
    pub quotation_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(rename = "customerGST")]
    pub customer_gst: String,
    pub company: CompanyView,
    pub items: Vec<QuotationLineView>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: String,
    pub created_date: NaiveDate,
    pub valid_until: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdated {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub quotation_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesOrderCreated {
    pub message: String,
    pub sales_order: String,
    pub quotation_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecorded {
    pub message: String,
    pub payment_entry: Uuid,
    pub quotation_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotationEdited {
    pub message: String,
    pub quotation_number: String,
    pub quotation_id: Uuid,
    pub data: QuotationView,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusStat {
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTrend {
    pub month: String,
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCustomer {
    pub customer_name: String,
    pub quotation_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotationStats {
    pub status_counts: BTreeMap<String, StatusStat>,
    pub monthly_trend: Vec<MonthlyTrend>,
    pub top_customers: Vec<TopCustomer>,
    pub total_quotations: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanySummary {
    pub name: String,
    pub company_name: String,
    pub default_currency: String,
}

/// Builds the dashboard figures from live quotations.
pub fn summarize(quotations: &[QuotationModel], today: NaiveDate) -> QuotationStats {
    let mut status_counts: BTreeMap<String, StatusStat> = BTreeMap::new();
    let mut months: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
    let mut customers: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
    let trend_start = today
        .checked_sub_months(Months::new(TREND_MONTHS))
        .unwrap_or(NaiveDate::MIN);

    for q in quotations {
        let stat = status_counts
            .entry(q.status.storefront_status().to_string())
            .or_default();
        stat.count += 1;
        stat.total_amount += q.grand_total;

        if q.transaction_date >= trend_start {
            let key = format!(
                "{:04}-{:02}",
                q.transaction_date.year(),
                q.transaction_date.month()
            );
            let month = months.entry(key).or_insert((0, Decimal::ZERO));
            month.0 += 1;
            month.1 += q.grand_total;
        }

        let customer = customers
            .entry(q.customer_name.clone())
            .or_insert((0, Decimal::ZERO));
        customer.0 += 1;
        customer.1 += q.grand_total;
    }

    let monthly_trend = months
        .into_iter()
        .rev()
        .take(TREND_MONTHS as usize)
        .map(|(month, (count, amount))| MonthlyTrend {
            month,
            count,
            amount,
        })
        .collect();

    let mut top_customers: Vec<TopCustomer> = customers
        .into_iter()
        .map(|(customer_name, (quotation_count, total_amount))| TopCustomer {
            customer_name,
            quotation_count,
            total_amount,
        })
        .collect();
    top_customers.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    top_customers.truncate(TOP_CUSTOMERS);

    let total_quotations = status_counts.values().map(|s| s.count).sum();
    let total_amount = status_counts.values().map(|s| s.total_amount).sum();

    QuotationStats {
        status_counts,
        monthly_trend,
        top_customers,
        total_quotations,
        total_amount,
    }
}

async fn add_comment<C: ConnectionTrait>(
    conn: &C,
    quotation_id: Uuid,
    content: String,
) -> Result<(), ServiceError> {
    quotation_comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        quotation_id: Set(quotation_id),
        content: Set(content),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Quotations from creation through approval, conversion and payment.
#[derive(Clone)]
pub struct QuotationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl QuotationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn find_quotation(&self, id: Uuid) -> Result<QuotationModel, ServiceError> {
        Quotation::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Quotation not found".to_string()))
    }

    async fn find_company(&self, name: &str) -> Result<CompanyModel, ServiceError> {
        Company::find_by_id(name.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", name)))
    }

    /// Customer with this exact name, created on first use.
    async fn ensure_customer<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        input: &CreateQuotationInput,
    ) -> Result<CustomerModel, ServiceError> {
        if let Some(existing) = Customer::find()
            .filter(customer::Column::CustomerName.eq(name))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let company_name = non_empty(input.customer_company.clone());
        let customer_type = if company_name.is_some() {
            CustomerType::Company
        } else {
            CustomerType::Individual
        };
        let mut new_customer = NewCustomer::new(name, customer_type, COMMERCIAL_GROUP);
        new_customer.mobile_no = non_empty(input.customer_phone.clone());
        new_customer.email_id = non_empty(input.customer_email.clone());
        new_customer.tax_id = non_empty(input.customer_gst.clone());
        let created = insert_customer(conn, new_customer).await?;

        if let Some(company_name) = company_name {
            insert_customer_address(
                conn,
                created.id,
                AddressInput {
                    address_title: name.to_string(),
                    address_type: Some(OFFICE_ADDRESS_TYPE.to_string()),
                    address_line1: company_name,
                    city: OFFICE_ADDRESS_CITY.to_string(),
                    is_primary_address: true,
                    is_shipping_address: true,
                    ..Default::default()
                },
            )
            .await?;
        }

        Ok(created)
    }

    /// Item master row for `product_id`, created from the line when unknown.
    async fn ensure_item<C: ConnectionTrait>(
        conn: &C,
        line: &QuotationItemInput,
    ) -> Result<String, ServiceError> {
        let item_code = non_empty(line.product_id.clone())
            .ok_or_else(|| ServiceError::ValidationError("product_id is required".to_string()))?;

        if Item::find_by_id(item_code.clone()).one(conn).await?.is_some() {
            return Ok(item_code);
        }

        let now = Utc::now();
        item::ActiveModel {
            item_code: Set(item_code.clone()),
            item_name: Set(non_empty(line.product_name.clone()).unwrap_or_else(|| item_code.clone())),
            description: Set(non_empty(line.variant.clone())),
            image: Set(non_empty(line.image.clone())),
            item_group: Set(Some(DEFAULT_ITEM_GROUP.to_string())),
            stock_uom: Set(Some(DEFAULT_UOM.to_string())),
            has_variants: Set(false),
            variant_of: Set(None),
            disabled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        Ok(item_code)
    }

    #[instrument(skip(self, input))]
    pub async fn create_quotation(
        &self,
        input: CreateQuotationInput,
    ) -> Result<QuotationCreated, ServiceError> {
        let customer_name = require(non_empty(input.customer_name.clone()), "customer_name")?;
        let customer_email = require(non_empty(input.customer_email.clone()), "customer_email")?;
        let lines = require(
            input.items.clone().filter(|items| !items.is_empty()),
            "items",
        )?;
        let company_name = require(non_empty(input.company.clone()), "company")?;

        let company = self.find_company(&company_name).await?;
        let today = Utc::now().date_naive();
        let transaction_date = input.created_date.unwrap_or(today);
        let valid_till = input.valid_until.unwrap_or_else(|| {
            today + chrono::Days::new(DEFAULT_VALIDITY_DAYS)
        });
        let submit = matches!(
            input.status.as_deref(),
            Some("sent") | Some("approved") | Some("paid")
        );
        let status = if submit {
            QuotationStatus::Submitted
        } else {
            QuotationStatus::Draft
        };

        let txn = self.db.begin().await?;
        let customer = Self::ensure_customer(&txn, &customer_name, &input).await?;

        let quotation_id = Uuid::new_v4();
        let mut rows = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let item_code = Self::ensure_item(&txn, line).await?;
            let qty = line.quantity.unwrap_or(Decimal::ONE);
            let rate = line.unit_price.unwrap_or(Decimal::ZERO);
            rows.push(quotation_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                quotation_id: Set(quotation_id),
                item_name: Set(non_empty(line.product_name.clone()).unwrap_or_else(|| item_code.clone())),
                item_code: Set(item_code),
                description: Set(non_empty(line.variant.clone())),
                variant: Set(non_empty(line.variant.clone())),
                qty: Set(qty),
                rate: Set(rate),
                amount: Set(qty * rate),
                uom: Set(DEFAULT_UOM.to_string()),
                image: Set(non_empty(line.image.clone())),
                idx: Set(idx as i32 + 1),
            });
        }

        let amounts: Vec<Decimal> = lines
            .iter()
            .map(|l| l.quantity.unwrap_or(Decimal::ONE) * l.unit_price.unwrap_or(Decimal::ZERO))
            .collect();
        let (net, taxes, grand, rounded) = compute_totals(&amounts, company.gst_rate);

        let now = Utc::now();
        let quotation = quotation::ActiveModel {
            id: Set(quotation_id),
            quotation_number: Set(document_number("QTN")),
            customer_id: Set(customer.id),
            customer_name: Set(customer.customer_name.clone()),
            contact_email: Set(Some(customer_email)),
            contact_mobile: Set(non_empty(input.customer_phone.clone())),
            tax_id: Set(non_empty(input.customer_gst.clone()).or(customer.tax_id.clone())),
            company: Set(company.name.clone()),
            currency: Set(company.default_currency.clone()),
            transaction_date: Set(transaction_date),
            valid_till: Set(valid_till),
            status: Set(status),
            docstatus: Set(if submit { 1 } else { 0 }),
            net_total: Set(net),
            total_taxes_and_charges: Set(taxes),
            grand_total: Set(grand),
            rounded_total: Set(rounded),
            notes: Set(non_empty(input.notes.clone())),
            terms: Set(non_empty(input.terms.clone())),
            payment_method: Set(None),
            paid_date: Set(None),
            sales_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for row in rows {
            row.insert(&txn).await?;
        }
        txn.commit().await?;

        info!(quotation = %quotation.quotation_number, customer = %quotation.customer_name, "Quotation created");
        self.event_sender
            .send_or_log(Event::QuotationCreated {
                quotation_id: quotation.id,
                quotation_number: quotation.quotation_number.clone(),
            })
            .await;

        Ok(QuotationCreated {
            id: quotation.id,
            quotation_number: quotation.quotation_number,
            status: quotation.status.storefront_status().to_string(),
            created_date: quotation.transaction_date,
            valid_until: quotation.valid_till,
        })
    }

    async fn line_image(&self, row: &QuotationItemModel) -> Result<String, ServiceError> {
        if let Some(image) = row.image.clone().filter(|i| !i.is_empty()) {
            return Ok(image);
        }
        if let Some(image) = WebsiteItem::find_by_id(row.item_code.clone())
            .one(&*self.db)
            .await?
            .and_then(|w| w.website_image)
            .filter(|i| !i.is_empty())
        {
            return Ok(image);
        }
        Ok(Item::find_by_id(row.item_code.clone())
            .one(&*self.db)
            .await?
            .and_then(|i| i.image)
            .unwrap_or_default())
    }

    async fn build_view(
        &self,
        quotation: QuotationModel,
        detailed: bool,
    ) -> Result<QuotationView, ServiceError> {
        let customer = Customer::find_by_id(quotation.customer_id)
            .one(&*self.db)
            .await?;
        let company = Company::find_by_id(quotation.company.clone())
            .one(&*self.db)
            .await?;

        let rows = quotation
            .find_related(QuotationItem)
            .order_by_asc(quotation_item::Column::Idx)
            .all(&*self.db)
            .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let image = self.line_image(&row).await?;
            items.push(QuotationLineView {
                product_id: row.item_code,
                product_name: row.item_name,
                variant: if detailed { row.variant.or(row.description) } else { None },
                quantity: row.qty,
                unit_price: row.rate,
                total_price: row.amount,
                image,
            });
        }

        let company = match company {
            Some(c) => CompanyView {
                name: c.company_name,
                gst: c.tax_id,
                currency: c.default_currency,
                email: detailed.then(|| c.email.unwrap_or_default()),
                phone: detailed.then(|| c.phone_no.unwrap_or_default()),
            },
            None => CompanyView {
                name: quotation.company.clone(),
                gst: None,
                currency: quotation.currency.clone(),
                email: None,
                phone: None,
            },
        };

        let (subtotal, gst, total) = resolve_totals(&quotation);
        let (customer_name, customer_phone, customer_gst) = match customer {
            Some(c) => (
                c.customer_name,
                c.mobile_no.unwrap_or_default(),
                quotation.tax_id.clone().or(c.tax_id).unwrap_or_default(),
            ),
            None => (
                quotation.customer_name.clone(),
                quotation.contact_mobile.clone().unwrap_or_default(),
                quotation.tax_id.clone().unwrap_or_default(),
            ),
        };

        Ok(QuotationView {
            id: quotation.id,
            quotation_number: quotation.quotation_number,
            customer_name,
            customer_email: quotation.contact_email.unwrap_or_default(),
            customer_phone,
            customer_gst,
            company,
            items,
            subtotal,
            gst,
            total,
            status: quotation.status.storefront_status().to_string(),
            created_date: quotation.transaction_date,
            valid_until: quotation.valid_till,
            notes: detailed.then(|| quotation.notes.unwrap_or_default()),
            terms: detailed.then(|| quotation.terms.unwrap_or_default()),
        })
    }

    /// Page of quotations, most recently modified first. Pages start at 1.
    #[instrument(skip(self))]
    pub async fn list_quotations(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<QuotationView>, ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "page must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ServiceError::ValidationError(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let quotations = Quotation::find()
            .order_by_desc(quotation::Column::UpdatedAt)
            .paginate(&*self.db, page_size)
            .fetch_page(page - 1)
            .await?;

        let mut views = Vec::with_capacity(quotations.len());
        for q in quotations {
            views.push(self.build_view(q, false).await?);
        }
        Ok(views)
    }

    pub async fn get_quotation_details(&self, id: Uuid) -> Result<QuotationView, ServiceError> {
        let quotation = self.find_quotation(id).await?;
        self.build_view(quotation, true).await
    }

    /// Creates the sales order inside `conn` and marks the quotation ordered.
    async fn convert_in<C: ConnectionTrait>(
        conn: &C,
        quotation: QuotationModel,
    ) -> Result<(QuotationModel, SalesOrderModel), ServiceError> {
        if quotation.sales_order_id.is_some() {
            return Err(ServiceError::InvalidOperation(
                "Quotation has already been converted to a Sales Order".to_string(),
            ));
        }
        if quotation.docstatus == 2 {
            return Err(ServiceError::InvalidOperation(
                "Cannot convert a cancelled quotation".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        let delivery_date = if quotation.valid_till >= today {
            quotation.valid_till
        } else {
            today + chrono::Days::new(DEFAULT_DELIVERY_DAYS)
        };

        let order = sales_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(document_number("SO")),
            quotation_id: Set(Some(quotation.id)),
            customer_id: Set(quotation.customer_id),
            customer_name: Set(quotation.customer_name.clone()),
            company: Set(quotation.company.clone()),
            currency: Set(quotation.currency.clone()),
            transaction_date: Set(today),
            delivery_date: Set(delivery_date),
            status: Set(SalesOrderStatus::ToDeliverAndBill),
            net_total: Set(quotation.net_total),
            total_taxes_and_charges: Set(quotation.total_taxes_and_charges),
            grand_total: Set(quotation.grand_total),
            rounded_total: Set(quotation.rounded_total),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;

        let rows = QuotationItem::find()
            .filter(quotation_item::Column::QuotationId.eq(quotation.id))
            .order_by_asc(quotation_item::Column::Idx)
            .all(conn)
            .await?;
        for row in rows {
            sales_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sales_order_id: Set(order.id),
                item_code: Set(row.item_code),
                item_name: Set(row.item_name),
                description: Set(row.description),
                qty: Set(row.qty),
                rate: Set(row.rate),
                amount: Set(row.amount),
                uom: Set(row.uom),
                prevdoc_quotation: Set(Some(quotation.id)),
                idx: Set(row.idx),
            }
            .insert(conn)
            .await?;
        }

        let mut model: quotation::ActiveModel = quotation.into();
        model.status = Set(QuotationStatus::Ordered);
        model.docstatus = Set(1);
        model.sales_order_id = Set(Some(order.id));
        model.updated_at = Set(Utc::now());
        let quotation = model.update(conn).await?;

        add_comment(
            conn,
            quotation.id,
            format!("Converted to Sales Order: {}", order.order_number),
        )
        .await?;

        Ok((quotation, order))
    }

    async fn publish_conversion(&self, quotation: &QuotationModel, order: &SalesOrderModel) {
        info!(quotation = %quotation.quotation_number, order = %order.order_number, "Quotation converted to sales order");
        self.event_sender
            .send_or_log(Event::SalesOrderCreated {
                sales_order_id: order.id,
                order_number: order.order_number.clone(),
                quotation_id: quotation.id,
            })
            .await;
    }

    async fn publish_status_change(
        &self,
        quotation: &QuotationModel,
        old_status: QuotationStatus,
    ) {
        if old_status == quotation.status {
            return;
        }
        self.event_sender
            .send_or_log(Event::QuotationStatusChanged {
                quotation_id: quotation.id,
                quotation_number: quotation.quotation_number.clone(),
                old_status: old_status.storefront_status().to_string(),
                new_status: quotation.status.storefront_status().to_string(),
            })
            .await;
    }

    /// Applies a storefront status; `approved` also converts to a sales order.
    #[instrument(skip(self, notes))]
    pub async fn update_quotation_status(
        &self,
        id: Uuid,
        status: &str,
        notes: Option<&str>,
    ) -> Result<StatusUpdated, ServiceError> {
        let quotation = self.find_quotation(id).await?;
        let new_status = QuotationStatus::from_storefront(status)
            .ok_or_else(|| ServiceError::ValidationError(format!("Invalid status: {}", status)))?;
        let old_status = quotation.status;
        if quotation.is_converted() && new_status != QuotationStatus::Ordered {
            return Err(ServiceError::InvalidOperation(
                "Quotation has already been converted to a Sales Order".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            add_comment(
                &txn,
                quotation.id,
                format!(
                    "Status changed from {} to {}: {}",
                    old_status.label(),
                    new_status.label(),
                    notes
                ),
            )
            .await?;
        }

        if status == "approved" {
            let (quotation, order) = Self::convert_in(&txn, quotation).await?;
            txn.commit().await?;

            self.publish_conversion(&quotation, &order).await;
            self.publish_status_change(&quotation, old_status).await;
            return Ok(StatusUpdated {
                message: format!(
                    "Quotation {} and converted to order {}",
                    status, order.order_number
                ),
                order_number: Some(order.order_number),
                quotation_status: quotation.status.storefront_status().to_string(),
            });
        }

        let submit = matches!(status, "sent" | "paid") && quotation.docstatus == 0;
        let mut model: quotation::ActiveModel = quotation.into();
        model.status = Set(new_status);
        if submit {
            model.docstatus = Set(1);
        }
        model.updated_at = Set(Utc::now());
        let quotation = model.update(&txn).await?;
        txn.commit().await?;

        self.publish_status_change(&quotation, old_status).await;
        Ok(StatusUpdated {
            message: format!("Quotation status updated to {}", status),
            order_number: None,
            quotation_status: quotation.status.storefront_status().to_string(),
        })
    }

    #[instrument(skip(self))]
    pub async fn convert_to_sales_order(&self, id: Uuid) -> Result<SalesOrderCreated, ServiceError> {
        let quotation = self.find_quotation(id).await?;
        let old_status = quotation.status;

        let txn = self.db.begin().await?;
        let (quotation, order) = Self::convert_in(&txn, quotation).await?;
        txn.commit().await?;

        self.publish_conversion(&quotation, &order).await;
        self.publish_status_change(&quotation, old_status).await;

        Ok(SalesOrderCreated {
            message: "Converted to Sales Order successfully".to_string(),
            sales_order: order.order_number,
            quotation_status: QuotationStatus::Ordered.storefront_status().to_string(),
        })
    }

    /// Records a received payment against an ordered quotation.
    #[instrument(skip(self))]
    pub async fn record_payment(
        &self,
        id: Uuid,
        payment_method: &str,
        amount: Option<Decimal>,
        transaction_id: Option<&str>,
    ) -> Result<PaymentRecorded, ServiceError> {
        let payment_method = payment_method.trim();
        if payment_method.is_empty() {
            return Err(ServiceError::ValidationError(
                "payment_method is required".to_string(),
            ));
        }
        if amount.map_or(false, |a| a <= Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "amount must be greater than zero".to_string(),
            ));
        }

        let quotation = self.find_quotation(id).await?;
        if quotation.status != QuotationStatus::Ordered {
            return Err(ServiceError::InvalidOperation(
                "Only approved quotations can be paid".to_string(),
            ));
        }

        let amount = amount.unwrap_or(quotation.grand_total);
        let reference = transaction_id
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(payment_reference);
        let today = Utc::now().date_naive();

        let txn = self.db.begin().await?;
        let entry = payment_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            payment_type: Set("Receive".to_string()),
            party_id: Set(quotation.customer_id),
            quotation_id: Set(Some(quotation.id)),
            paid_amount: Set(amount),
            mode_of_payment: Set(payment_method.to_string()),
            reference_no: Set(reference.clone()),
            reference_date: Set(today),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        add_comment(
            &txn,
            quotation.id,
            format!(
                "Payment received via {}. Amount: {}. Transaction ID: {}",
                payment_method,
                amount.normalize(),
                reference
            ),
        )
        .await?;

        let quotation_id = quotation.id;
        let quotation_number = quotation.quotation_number.clone();
        let mut model: quotation::ActiveModel = quotation.into();
        model.payment_method = Set(Some(payment_method.to_string()));
        model.paid_date = Set(Some(today));
        model.updated_at = Set(Utc::now());
        model.update(&txn).await?;
        txn.commit().await?;

        info!(quotation = %quotation_number, amount = %amount, "Payment recorded");
        self.event_sender
            .send_or_log(Event::PaymentRecorded {
                quotation_id,
                quotation_number,
                amount,
                mode_of_payment: payment_method.to_string(),
            })
            .await;

        Ok(PaymentRecorded {
            message: "Payment recorded successfully".to_string(),
            payment_entry: entry.id,
            quotation_status: QuotationStatus::Ordered.storefront_status().to_string(),
        })
    }

    #[instrument(skip(self, input))]
    pub async fn edit_quotation(
        &self,
        input: EditQuotationInput,
    ) -> Result<QuotationEdited, ServiceError> {
        let id = require(input.quotation_id, "quotation_id")?;
        let number = require(non_empty(input.quotation_number.clone()), "quotation_number")?;

        let quotation = self.find_quotation(id).await?;
        if quotation.quotation_number != number {
            return Err(ServiceError::ValidationError(
                "quotation_number does not match quotation_id".to_string(),
            ));
        }
        let old_status = quotation.status;
        let docstatus = quotation.docstatus;

        let mut model: quotation::ActiveModel = quotation.into();
        if let Some(status) = non_empty(input.status.clone()) {
            let new_status = QuotationStatus::from_storefront(&status)
                .ok_or_else(|| ServiceError::ValidationError(format!("Invalid status: {}", status)))?;
            model.status = Set(new_status);
            match status.as_str() {
                "sent" | "approved" | "paid" if docstatus == 0 => model.docstatus = Set(1),
                "draft" | "rejected" | "expired" if docstatus == 1 => model.docstatus = Set(2),
                _ => {}
            }
        }
        if let Some(v) = non_empty(input.customer_name) {
            model.customer_name = Set(v);
        }
        if let Some(v) = non_empty(input.customer_email) {
            model.contact_email = Set(Some(v));
        }
        if let Some(v) = non_empty(input.customer_phone) {
            model.contact_mobile = Set(Some(v));
        }
        if let Some(v) = input.customer_gst {
            model.tax_id = Set(non_empty(Some(v)));
        }
        if let Some(v) = input.notes {
            model.notes = Set(Some(v));
        }
        if let Some(v) = input.terms {
            model.terms = Set(Some(v));
        }
        if let Some(v) = input.valid_until {
            model.valid_till = Set(v);
        }
        model.updated_at = Set(Utc::now());
        let quotation = model.update(&*self.db).await?;

        self.publish_status_change(&quotation, old_status).await;

        let data = self.build_view(quotation, true).await?;
        Ok(QuotationEdited {
            message: "Quotation updated successfully".to_string(),
            quotation_number: data.quotation_number.clone(),
            quotation_id: data.id,
            data,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_quotation(&self, id: Uuid) -> Result<String, ServiceError> {
        let quotation = self.find_quotation(id).await?;
        if !quotation.status.is_deletable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot delete quotation with status: {}",
                quotation.status.label()
            )));
        }
        if quotation.is_converted() {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot delete quotation {}: it has been converted to a Sales Order",
                quotation.quotation_number
            )));
        }

        let number = quotation.quotation_number.clone();
        let txn = self.db.begin().await?;
        QuotationItem::delete_many()
            .filter(quotation_item::Column::QuotationId.eq(quotation.id))
            .exec(&txn)
            .await?;
        QuotationComment::delete_many()
            .filter(quotation_comment::Column::QuotationId.eq(quotation.id))
            .exec(&txn)
            .await?;
        quotation.delete(&txn).await?;
        txn.commit().await?;

        info!(quotation = %number, "Quotation deleted");
        Ok(format!("Quotation {} deleted successfully", number))
    }

    #[instrument(skip(self))]
    pub async fn quotation_stats(&self) -> Result<QuotationStats, ServiceError> {
        let quotations = Quotation::find()
            .filter(quotation::Column::Docstatus.lt(2))
            .filter(quotation::Column::Status.ne(QuotationStatus::Cancelled))
            .all(&*self.db)
            .await?;
        Ok(summarize(&quotations, Utc::now().date_naive()))
    }

    pub async fn list_companies(&self) -> Result<Vec<CompanySummary>, ServiceError> {
        Ok(Company::find()
            .order_by_asc(crate::entities::sales::company::Column::Name)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| CompanySummary {
                name: c.name,
                company_name: c.company_name,
                default_currency: c.default_currency,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quotation(customer: &str, status: QuotationStatus, date: NaiveDate, grand: Decimal) -> QuotationModel {
        let now = Utc::now();
        QuotationModel {
            id: Uuid::new_v4(),
            quotation_number: document_number("QTN"),
            customer_id: Uuid::new_v4(),
            customer_name: customer.to_string(),
            contact_email: None,
            contact_mobile: None,
            tax_id: None,
            company: "Storefront Traders".to_string(),
            currency: "INR".to_string(),
            transaction_date: date,
            valid_till: date,
            status,
            docstatus: 0,
            net_total: grand,
            total_taxes_and_charges: Decimal::ZERO,
            grand_total: grand,
            rounded_total: grand,
            notes: None,
            terms: None,
            payment_method: None,
            paid_date: None,
            sales_order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn totals_apply_gst_and_round_to_whole_units() {
        let (net, taxes, grand, rounded) =
            compute_totals(&[dec!(250.50), dec!(100)], dec!(0.18));
        assert_eq!(net, dec!(350.50));
        assert_eq!(taxes, dec!(63.09));
        assert_eq!(grand, dec!(413.59));
        assert_eq!(rounded, dec!(414));
    }

    #[test]
    fn document_numbers_have_prefix_and_eight_characters() {
        let number = document_number("SO");
        assert!(number.starts_with("SO-"));
        assert_eq!(number.len(), 11);
    }

    #[test]
    fn resolved_total_falls_back_to_rounded() {
        let mut q = quotation(
            "Asha",
            QuotationStatus::Draft,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            dec!(0),
        );
        q.net_total = dec!(100);
        q.rounded_total = dec!(118);
        let (subtotal, gst, total) = resolve_totals(&q);
        assert_eq!((subtotal, gst, total), (dec!(100), dec!(18), dec!(118)));
    }

    #[test]
    fn stats_group_by_storefront_status_month_and_customer() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let quotations = vec![
            quotation("Asha", QuotationStatus::Draft, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), dec!(100)),
            quotation("Asha", QuotationStatus::Open, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), dec!(300)),
            quotation("Ravi", QuotationStatus::Submitted, NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(), dec!(50)),
            quotation("Meera", QuotationStatus::Ordered, NaiveDate::from_ymd_opt(2023, 1, 9).unwrap(), dec!(1000)),
        ];

        let stats = summarize(&quotations, today);

        assert_eq!(stats.total_quotations, 4);
        assert_eq!(stats.total_amount, dec!(1450));
        assert_eq!(stats.status_counts["sent"].count, 2);
        assert_eq!(stats.status_counts["sent"].total_amount, dec!(350));
        assert_eq!(stats.status_counts["approved"].count, 1);

        let months: Vec<_> = stats.monthly_trend.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2024-06", "2024-05"]);

        assert_eq!(stats.top_customers[0].customer_name, "Meera");
        assert_eq!(stats.top_customers[1].customer_name, "Asha");
        assert_eq!(stats.top_customers[1].quotation_count, 2);
    }
}
