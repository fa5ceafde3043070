use crate::{
    entities::{
        sales::{Quotation, SalesOrder},
        user_notification::{self, Entity as UserNotification, Model as UserNotificationModel},
    },
    errors::ServiceError,
    events::{Event, EventHandler},
    services::commerce::CustomerService,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

pub const QUICK_ORDER_DOCUMENT: &str = "Quick Order";
pub const QUOTATION_DOCUMENT: &str = "Quotation";
pub const SALES_ORDER_DOCUMENT: &str = "Sales Order";

/// Outcome of marking a single notification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Marked,
    AlreadyRead,
}

impl ReadOutcome {
    pub fn as_status(&self) -> &'static str {
        match self {
            ReadOutcome::Marked => "success",
            ReadOutcome::AlreadyRead => "already_read",
        }
    }
}

fn validate_page(limit: i64, offset: i64) -> Result<(u64, u64), ServiceError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ServiceError::ValidationError(
            "Limit must be between 1 and 100".to_string(),
        ));
    }
    if offset < 0 {
        return Err(ServiceError::ValidationError(
            "Offset cannot be negative".to_string(),
        ));
    }
    Ok((limit as u64, offset as u64))
}

/// In-app notifications addressed to a user by email.
#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The caller's notifications, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_email: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserNotificationModel>, ServiceError> {
        let (limit, offset) = validate_page(limit, offset)?;

        Ok(UserNotification::find()
            .filter(user_notification::Column::UserEmail.eq(user_email))
            .order_by_desc(user_notification::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    pub async fn unread_count(&self, user_email: &str) -> Result<u64, ServiceError> {
        Ok(UserNotification::find()
            .filter(user_notification::Column::UserEmail.eq(user_email))
            .filter(user_notification::Column::IsRead.eq(false))
            .count(&*self.db)
            .await?)
    }

    /// Idempotent: a notification that is already read is left untouched.
    #[instrument(skip(self))]
    pub async fn mark_as_read(
        &self,
        user_email: &str,
        notification_id: Uuid,
    ) -> Result<ReadOutcome, ServiceError> {
        let notification = UserNotification::find_by_id(notification_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".to_string()))?;

        if notification.user_email != user_email {
            return Err(ServiceError::Forbidden(
                "You are not allowed to access this notification".to_string(),
            ));
        }
        if notification.is_read {
            return Ok(ReadOutcome::AlreadyRead);
        }

        let mut model: user_notification::ActiveModel = notification.into();
        model.is_read = Set(true);
        model.read_at = Set(Some(Utc::now()));
        model.update(&*self.db).await?;

        Ok(ReadOutcome::Marked)
    }

    /// Returns how many notifications changed.
    #[instrument(skip(self))]
    pub async fn mark_all_as_read(&self, user_email: &str) -> Result<u64, ServiceError> {
        let result = UserNotification::update_many()
            .col_expr(user_notification::Column::IsRead, Expr::value(true))
            .col_expr(user_notification::Column::ReadAt, Expr::value(Some(Utc::now())))
            .filter(user_notification::Column::UserEmail.eq(user_email))
            .filter(user_notification::Column::IsRead.eq(false))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Writes one unread notification per recipient.
    pub async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        message: &str,
        document_type: &str,
        document_name: &str,
    ) -> Result<(), ServiceError> {
        for email in recipients {
            user_notification::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_email: Set(email.clone()),
                subject: Set(subject.to_string()),
                message: Set(message.to_string()),
                document_type: Set(Some(document_type.to_string())),
                document_name: Set(Some(document_name.to_string())),
                is_read: Set(false),
                read_at: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(&*self.db)
            .await?;
        }
        Ok(())
    }
}

/// Turns customer-facing domain events into user notifications.
pub struct NotificationEventHandler {
    db: Arc<DatabaseConnection>,
    notifications: NotificationService,
    customers: CustomerService,
}

impl NotificationEventHandler {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            notifications: NotificationService::new(db.clone()),
            customers: CustomerService::new(db.clone()),
            db,
        }
    }

    async fn quotation_customer(&self, quotation_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        Ok(Quotation::find_by_id(quotation_id)
            .one(&*self.db)
            .await?
            .map(|q| q.customer_id))
    }

    async fn deliver(
        &self,
        customer_id: Option<Uuid>,
        subject: String,
        message: String,
        document_type: &str,
        document_name: String,
    ) -> Result<(), ServiceError> {
        let Some(customer_id) = customer_id else {
            return Ok(());
        };
        let recipients = self.customers.user_emails_for_customer(customer_id).await?;
        if recipients.is_empty() {
            debug!(%customer_id, "No storefront user to notify");
            return Ok(());
        }
        self.notifications
            .notify(&recipients, &subject, &message, document_type, &document_name)
            .await
    }

    async fn handle(&self, event: &Event) -> Result<(), ServiceError> {
        match event {
            Event::CartSubmitted {
                cart_id,
                customer_id,
            } => {
                self.deliver(
                    Some(*customer_id),
                    "Order submitted".to_string(),
                    "Your quick order has been submitted for processing".to_string(),
                    QUICK_ORDER_DOCUMENT,
                    cart_id.to_string(),
                )
                .await
            }
            Event::QuotationStatusChanged {
                quotation_id,
                quotation_number,
                old_status,
                new_status,
            } => {
                let customer = self.quotation_customer(*quotation_id).await?;
                self.deliver(
                    customer,
                    format!("Quotation {} updated", quotation_number),
                    format!(
                        "Quotation {} changed from {} to {}",
                        quotation_number, old_status, new_status
                    ),
                    QUOTATION_DOCUMENT,
                    quotation_number.clone(),
                )
                .await
            }
            Event::SalesOrderCreated {
                sales_order_id,
                order_number,
                ..
            } => {
                let customer = SalesOrder::find_by_id(*sales_order_id)
                    .one(&*self.db)
                    .await?
                    .map(|o| o.customer_id);
                self.deliver(
                    customer,
                    format!("Sales order {} created", order_number),
                    format!("Your quotation has been converted to sales order {}", order_number),
                    SALES_ORDER_DOCUMENT,
                    order_number.clone(),
                )
                .await
            }
            Event::PaymentRecorded {
                quotation_id,
                quotation_number,
                amount,
                mode_of_payment,
            } => {
                let customer = self.quotation_customer(*quotation_id).await?;
                self.deliver(
                    customer,
                    "Payment received".to_string(),
                    format!(
                        "Payment of {} via {} received for quotation {}",
                        amount.normalize(),
                        mode_of_payment,
                        quotation_number
                    ),
                    QUOTATION_DOCUMENT,
                    quotation_number.clone(),
                )
                .await
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EventHandler for NotificationEventHandler {
    async fn handle_event(&self, event: &Event) -> Result<(), String> {
        self.handle(event).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, "Limit must be between 1 and 100")]
    #[case(101, 0, "Limit must be between 1 and 100")]
    #[case(20, -1, "Offset cannot be negative")]
    fn page_bounds_are_enforced(#[case] limit: i64, #[case] offset: i64, #[case] expected: &str) {
        assert_matches!(
            validate_page(limit, offset),
            Err(ServiceError::ValidationError(msg)) if msg == expected
        );
    }

    #[test]
    fn page_within_bounds_passes() {
        assert_eq!(validate_page(100, 40).unwrap(), (100, 40));
        assert_eq!(validate_page(1, 0).unwrap(), (1, 0));
    }

    #[test]
    fn read_outcome_statuses() {
        assert_eq!(ReadOutcome::Marked.as_status(), "success");
        assert_eq!(ReadOutcome::AlreadyRead.as_status(), "already_read");
    }
}
