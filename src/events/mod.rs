use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Capacity of the in-process event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the processor is gone.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, "Dropping event: {}", e);
        }
    }
}

/// Domain events published by the services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    UserRegistered {
        email: String,
    },
    PasswordReset {
        email: String,
    },
    CartSubmitted {
        cart_id: Uuid,
        customer_id: Uuid,
    },
    QuotationCreated {
        quotation_id: Uuid,
        quotation_number: String,
    },
    QuotationStatusChanged {
        quotation_id: Uuid,
        quotation_number: String,
        old_status: String,
        new_status: String,
    },
    SalesOrderCreated {
        sales_order_id: Uuid,
        order_number: String,
        quotation_id: Uuid,
    },
    PaymentRecorded {
        quotation_id: Uuid,
        quotation_number: String,
        amount: Decimal,
        mode_of_payment: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserRegistered { .. } => "user_registered",
            Event::PasswordReset { .. } => "password_reset",
            Event::CartSubmitted { .. } => "cart_submitted",
            Event::QuotationCreated { .. } => "quotation_created",
            Event::QuotationStatusChanged { .. } => "quotation_status_changed",
            Event::SalesOrderCreated { .. } => "sales_order_created",
            Event::PaymentRecorded { .. } => "payment_recorded",
        }
    }
}

// Handlers implementing this trait process events in the background task.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: &Event) -> Result<(), String>;
}

/// Builds a connected sender/receiver pair.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSender::new(tx), rx)
}

/// Drains `rx` until every sender is dropped, handing each event to all handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Arc<dyn EventHandler>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!(event = event.name(), "Received event: {:?}", event);

        for handler in &handlers {
            if let Err(e) = handler.handle_event(&event).await {
                error!(event = event.name(), "Event handler failed: {}", e);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle_event(&self, event: &Event) -> Result<(), String> {
            self.seen.lock().unwrap().push(event.name());
            if matches!(event, Event::PasswordReset { .. }) {
                return Err("boom".to_string());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn processor_feeds_every_handler_and_survives_failures() {
        let (sender, rx) = channel();
        let recorder = Arc::new(Recorder::default());
        let task = tokio::spawn(process_events(rx, vec![recorder.clone()]));

        sender
            .send(Event::PasswordReset {
                email: "asha@example.com".into(),
            })
            .await
            .unwrap();
        sender
            .send(Event::UserRegistered {
                email: "asha@example.com".into(),
            })
            .await
            .unwrap();
        drop(sender);
        task.await.unwrap();

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["password_reset", "user_registered"]
        );
    }

    #[tokio::test]
    async fn send_or_log_tolerates_a_closed_channel() {
        let (sender, rx) = channel();
        drop(rx);
        sender
            .send_or_log(Event::UserRegistered {
                email: "asha@example.com".into(),
            })
            .await;
        assert!(sender
            .send(Event::UserRegistered {
                email: "asha@example.com".into()
            })
            .await
            .is_err());
    }
}
