use crate::{
    entities::{
        catalog::{item_price, website_item, ItemPrice, WebsiteItem, WebsiteItemModel},
        commerce::{
            quick_order, quick_order_item, shipping_process, warehouse, Customer, QuickOrder,
            QuickOrderItem, QuickOrderItemModel, QuickOrderModel, QuickOrderStatus,
            ShippingProcess, Warehouse,
        },
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::address_service::is_address_linked,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// One requested line; a zero quantity removes the item.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CartItemInput {
    pub item_code: Option<String>,
    #[serde(default)]
    pub qty: Decimal,
}

/// Any combination of item changes, shipping process and addresses.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CartUpdate {
    pub items: Option<Vec<CartItemInput>>,
    pub shipping_process: Option<String>,
    pub shipping_address: Option<Uuid>,
    pub billing_address: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingProcessSummary {
    pub name: String,
    pub shipping_process: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub name: Uuid,
    pub item_code: String,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    pub uom: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub image: Option<String>,
}

/// Cart as shown to the shopper; empty when the customer has no draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<Uuid>,
    pub items: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub shipping_address: Option<Uuid>,
    pub billing_address: Option<Uuid>,
    pub shipping_process: Option<String>,
}

impl CartView {
    fn empty() -> Self {
        Self {
            cart_id: None,
            items: Vec::new(),
            total: Decimal::ZERO,
            shipping_address: None,
            billing_address: None,
            shipping_process: None,
        }
    }
}

/// A validated line; `listing` is present whenever `qty > 0`.
struct PendingLine {
    item_code: String,
    qty: Decimal,
    listing: Option<WebsiteItemModel>,
}

/// Cart operations on top of draft quick orders.
///
/// A customer's cart is its most recently modified draft quick order. Submitting
/// the cart moves it out of draft, so the next update starts a new one.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Shipping processes, newest first.
    #[instrument(skip(self))]
    pub async fn get_shipping_processes(&self) -> Result<Vec<ShippingProcessSummary>, ServiceError> {
        let processes = ShippingProcess::find()
            .order_by_desc(shipping_process::Column::UpdatedAt)
            .all(&*self.db)
            .await?;

        Ok(processes
            .into_iter()
            .map(|p| ShippingProcessSummary {
                name: p.name,
                shipping_process: p.shipping_process,
            })
            .collect())
    }

    async fn ensure_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }

    async fn existing_cart<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
    ) -> Result<Option<QuickOrderModel>, ServiceError> {
        Ok(QuickOrder::find()
            .filter(quick_order::Column::CustomerId.eq(customer_id))
            .filter(quick_order::Column::Status.eq(QuickOrderStatus::Draft))
            .order_by_desc(quick_order::Column::UpdatedAt)
            .one(conn)
            .await?)
    }

    async fn cart_items<C: ConnectionTrait>(
        conn: &C,
        cart_id: Uuid,
    ) -> Result<Vec<QuickOrderItemModel>, ServiceError> {
        Ok(QuickOrderItem::find()
            .filter(quick_order_item::Column::QuickOrderId.eq(cart_id))
            .order_by_asc(quick_order_item::Column::Idx)
            .all(conn)
            .await?)
    }

    /// Checks each line and loads the website listing for lines that add stock.
    async fn validate_lines(
        &self,
        items: Vec<CartItemInput>,
    ) -> Result<Vec<PendingLine>, ServiceError> {
        let mut lines: Vec<PendingLine> = Vec::with_capacity(items.len());

        for item in items {
            let item_code = item
                .item_code
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty())
                .ok_or_else(|| ServiceError::ValidationError("item_code is required".to_string()))?;

            if item.qty < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "qty cannot be negative".to_string(),
                ));
            }

            let listing = if item.qty > Decimal::ZERO {
                let cached = lines
                    .iter()
                    .find(|line| line.item_code == item_code)
                    .and_then(|line| line.listing.clone());
                let listing = match cached {
                    Some(listing) => Some(listing),
                    None => WebsiteItem::find()
                        .filter(website_item::Column::ItemCode.eq(item_code.as_str()))
                        .one(&*self.db)
                        .await?,
                };
                match listing {
                    Some(listing) if listing.published => Some(listing),
                    _ => {
                        return Err(ServiceError::ValidationError(format!(
                            "Item {} not available",
                            item_code
                        )))
                    }
                }
            } else {
                None
            };

            lines.push(PendingLine {
                item_code,
                qty: item.qty,
                listing,
            });
        }

        Ok(lines)
    }

    async fn validate_shipping_process(&self, name: &str) -> Result<(), ServiceError> {
        ShippingProcess::find_by_id(name.to_string())
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::ValidationError("Invalid Shipping Process".to_string()))
    }

    async fn validate_addresses(
        &self,
        customer_id: Uuid,
        update: &CartUpdate,
    ) -> Result<(), ServiceError> {
        if let Some(address) = update.shipping_address {
            if !is_address_linked(&*self.db, address, customer_id).await? {
                return Err(ServiceError::Forbidden(
                    "Shipping address not found or unauthorized".to_string(),
                ));
            }
        }
        if let Some(address) = update.billing_address {
            if !is_address_linked(&*self.db, address, customer_id).await? {
                return Err(ServiceError::Forbidden(
                    "Billing address not found or unauthorized".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Applies `lines` to a cart: zero removes, a known item gets its qty
    /// replaced, anything else is appended.
    async fn merge_lines<C: ConnectionTrait>(
        conn: &C,
        cart_id: Uuid,
        lines: Vec<PendingLine>,
    ) -> Result<(), ServiceError> {
        let mut current = Self::cart_items(conn, cart_id).await?;

        for line in lines {
            let position = current.iter().position(|row| row.item_code == line.item_code);

            match (position, line.qty.is_zero()) {
                (Some(pos), true) => {
                    let row = current.remove(pos);
                    row.delete(conn).await?;
                }
                (None, true) => {}
                (Some(pos), false) => {
                    let mut row: quick_order_item::ActiveModel = current[pos].clone().into();
                    row.qty = Set(line.qty);
                    current[pos] = row.update(conn).await?;
                }
                (None, false) => {
                    let Some(listing) = line.listing else {
                        continue;
                    };
                    let next_idx = current.iter().map(|row| row.idx).max().unwrap_or(0) + 1;
                    let row = quick_order_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        quick_order_id: Set(cart_id),
                        item_code: Set(listing.item_code),
                        item_name: Set(listing.web_item_name),
                        qty: Set(line.qty),
                        uom: Set(listing.stock_uom),
                        idx: Set(next_idx),
                        created_at: Set(Utc::now()),
                    }
                    .insert(conn)
                    .await?;
                    current.push(row);
                }
            }
        }

        Ok(())
    }

    async fn create_cart<C: ConnectionTrait>(
        conn: &C,
        customer_id: Uuid,
        shipping_process: Option<String>,
    ) -> Result<QuickOrderModel, ServiceError> {
        let shipping_process = match shipping_process {
            Some(process) => process,
            None => ShippingProcess::find()
                .order_by_desc(shipping_process::Column::UpdatedAt)
                .one(conn)
                .await?
                .map(|p| p.name)
                .ok_or_else(|| {
                    ServiceError::ValidationError("No Shipping Process available".to_string())
                })?,
        };

        let warehouse = Warehouse::find()
            .filter(warehouse::Column::IsAvailable.eq(true))
            .order_by_asc(warehouse::Column::Name)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "No Available Warehouse found to create cart".to_string(),
                )
            })?;

        let now = Utc::now();
        let cart = quick_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            status: Set(QuickOrderStatus::Draft),
            shipping_process: Set(Some(shipping_process)),
            warehouse: Set(Some(warehouse.name)),
            shipping_address: Set(None),
            billing_address: Set(None),
            submitted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        Ok(cart)
    }

    /// Creates or updates the customer's cart.
    #[instrument(skip(self, update))]
    pub async fn update_cart(
        &self,
        customer_id: Uuid,
        mut update: CartUpdate,
    ) -> Result<Uuid, ServiceError> {
        self.ensure_customer(customer_id).await?;

        let items = update.items.take().filter(|items| !items.is_empty());
        let shipping_process = update
            .shipping_process
            .take()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if items.is_none()
            && shipping_process.is_none()
            && update.shipping_address.is_none()
            && update.billing_address.is_none()
        {
            return Err(ServiceError::ValidationError(
                "At least one of items, shipping_process, shipping_address, or billing_address must be provided"
                    .to_string(),
            ));
        }

        let lines = match items {
            Some(items) => Some(self.validate_lines(items).await?),
            None => None,
        };
        if let Some(process) = shipping_process.as_deref() {
            self.validate_shipping_process(process).await?;
        }
        self.validate_addresses(customer_id, &update).await?;

        let txn = self.db.begin().await?;
        let existing = Self::existing_cart(&txn, customer_id).await?;

        let (cart, process_to_set) = match (existing, lines) {
            (Some(cart), Some(lines)) => {
                Self::merge_lines(&txn, cart.id, lines).await?;
                (cart, shipping_process)
            }
            (Some(cart), None) => (cart, shipping_process),
            (None, Some(lines)) => {
                if !lines.iter().any(|line| line.qty > Decimal::ZERO) {
                    return Err(ServiceError::ValidationError(
                        "At least one item with qty > 0 is required to create a cart".to_string(),
                    ));
                }
                let cart = Self::create_cart(&txn, customer_id, shipping_process).await?;
                Self::merge_lines(&txn, cart.id, lines).await?;
                (cart, None)
            }
            (None, None) => {
                return Err(ServiceError::NotFound(
                    "Cart not found for this customer".to_string(),
                ))
            }
        };

        let cart_id = cart.id;
        let mut model: quick_order::ActiveModel = cart.into();
        if let Some(process) = process_to_set {
            model.shipping_process = Set(Some(process));
        }
        if let Some(address) = update.shipping_address {
            model.shipping_address = Set(Some(address));
            model.billing_address = Set(Some(address));
        } else if let Some(address) = update.billing_address {
            model.billing_address = Set(Some(address));
        }
        model.updated_at = Set(Utc::now());
        model.update(&txn).await?;

        txn.commit().await?;
        info!(cart_id = %cart_id, customer_id = %customer_id, "Cart updated");
        Ok(cart_id)
    }

    async fn selling_price(&self, item_code: &str) -> Result<Decimal, ServiceError> {
        Ok(ItemPrice::find()
            .filter(item_price::Column::ItemCode.eq(item_code))
            .filter(item_price::Column::Selling.eq(true))
            .order_by_desc(item_price::Column::UpdatedAt)
            .one(&*self.db)
            .await?
            .map(|p| p.price_list_rate)
            .unwrap_or(Decimal::ZERO))
    }

    /// Current cart with prices; unknown customers get an empty cart.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, customer_id: Uuid) -> Result<CartView, ServiceError> {
        if Customer::find_by_id(customer_id).one(&*self.db).await?.is_none() {
            return Ok(CartView::empty());
        }
        let Some(cart) = Self::existing_cart(&*self.db, customer_id).await? else {
            return Ok(CartView::empty());
        };

        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for row in Self::cart_items(&*self.db, cart.id).await? {
            let listing = WebsiteItem::find_by_id(row.item_code.clone())
                .one(&*self.db)
                .await?;
            let price = self.selling_price(&row.item_code).await?;
            let line_total = price * row.qty;
            total += line_total;

            let (item_name, image) = match listing {
                Some(listing) => (listing.web_item_name, listing.website_image),
                None => (row.item_name, None),
            };
            items.push(CartLine {
                name: row.id,
                item_code: row.item_code,
                item_name,
                qty: row.qty,
                uom: row.uom,
                price,
                total: line_total,
                image,
            });
        }

        Ok(CartView {
            cart_id: Some(cart.id),
            items,
            total,
            shipping_address: cart.shipping_address,
            billing_address: cart.billing_address,
            shipping_process: cart.shipping_process,
        })
    }

    /// Empties the cart but keeps the draft.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        self.ensure_customer(customer_id).await?;
        let cart = Self::existing_cart(&*self.db, customer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))?;

        let txn = self.db.begin().await?;
        QuickOrderItem::delete_many()
            .filter(quick_order_item::Column::QuickOrderId.eq(cart.id))
            .exec(&txn)
            .await?;
        let mut model: quick_order::ActiveModel = cart.into();
        model.updated_at = Set(Utc::now());
        model.update(&txn).await?;
        txn.commit().await?;

        Ok(())
    }

    /// Moves a draft cart to submitted and announces it.
    #[instrument(skip(self))]
    pub async fn submit_cart(
        &self,
        customer_id: Uuid,
        cart_id: Option<Uuid>,
    ) -> Result<Uuid, ServiceError> {
        self.ensure_customer(customer_id).await?;

        let cart = match cart_id {
            Some(cart_id) => {
                let cart = QuickOrder::find_by_id(cart_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))?;
                if cart.customer_id != customer_id {
                    return Err(ServiceError::Forbidden(
                        "Unauthorized access to cart".to_string(),
                    ));
                }
                cart
            }
            None => Self::existing_cart(&*self.db, customer_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound("Cart not found for this customer".to_string())
                })?,
        };

        if cart.status != QuickOrderStatus::Draft {
            return Err(ServiceError::InvalidOperation(
                "Cart is already submitted or cancelled".to_string(),
            ));
        }
        if Self::cart_items(&*self.db, cart.id).await?.is_empty() {
            return Err(ServiceError::ValidationError(
                "Cannot submit an empty cart".to_string(),
            ));
        }
        if cart.shipping_process.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::ValidationError(
                "Shipping Process is required to submit cart".to_string(),
            ));
        }

        let cart_id = cart.id;
        let now = Utc::now();
        // Only a cart still in Draft may flip; a concurrent submit sees zero rows.
        let txn = self.db.begin().await?;
        let result = QuickOrder::update_many()
            .col_expr(quick_order::Column::Status, Expr::value(QuickOrderStatus::Submitted))
            .col_expr(quick_order::Column::SubmittedAt, Expr::value(Some(now)))
            .col_expr(quick_order::Column::UpdatedAt, Expr::value(now))
            .filter(quick_order::Column::Id.eq(cart_id))
            .filter(quick_order::Column::Status.eq(QuickOrderStatus::Draft))
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            txn.rollback().await?;
            return Err(ServiceError::InvalidOperation(
                "Cart is already submitted or cancelled".to_string(),
            ));
        }
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartSubmitted {
                cart_id,
                customer_id,
            })
            .await;

        info!(cart_id = %cart_id, customer_id = %customer_id, "Cart submitted");
        Ok(cart_id)
    }
}
