use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

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
}

// The events that can occur in the checkout/fulfillment pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A buyer was redirected to the gateway's hosted payment page.
    CheckoutInitiated {
        tenant_id: Uuid,
        user_id: Uuid,
        reference: String,
        total_amount: Decimal,
    },

    /// An order row was created for a confirmed transaction.
    OrderMaterialized {
        order_id: Uuid,
        tenant_id: Uuid,
        user_id: Uuid,
        reference: String,
    },

    /// A confirmation arrived for a reference that already has an order.
    DuplicateConfirmation { reference: String },

    /// The gateway reported a failed or abandoned transaction.
    PaymentFailed {
        reference: String,
        gateway_status: String,
    },

    /// A tenant finished payment onboarding (subaccount created).
    TenantPaymentEnabled { tenant_id: Uuid },
}

/// Background loop draining the event channel. Events are currently consumed
/// for structured logging and analytics hooks.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::CheckoutInitiated {
                tenant_id,
                user_id,
                reference,
                total_amount,
            } => {
                info!(
                    %tenant_id,
                    %user_id,
                    %reference,
                    %total_amount,
                    "Checkout initiated"
                );
            }
            Event::OrderMaterialized {
                order_id,
                tenant_id,
                user_id,
                reference,
            } => {
                info!(
                    %order_id,
                    %tenant_id,
                    %user_id,
                    %reference,
                    "Order materialized"
                );
            }
            Event::DuplicateConfirmation { reference } => {
                info!(%reference, "Duplicate confirmation ignored");
            }
            Event::PaymentFailed {
                reference,
                gateway_status,
            } => {
                warn!(%reference, %gateway_status, "Payment failed");
            }
            Event::TenantPaymentEnabled { tenant_id } => {
                info!(%tenant_id, "Tenant payment onboarding complete");
            }
        }
    }

    error!("Event processing loop terminated: channel closed");
}
