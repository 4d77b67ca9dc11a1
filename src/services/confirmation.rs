//! Payment confirmation: turns a confirmed gateway transaction into exactly
//! one order row, no matter how many triggers fire.
//!
//! Two triggers converge here: the asynchronous webhook from the gateway and
//! the buyer's synchronous redirect-driven verify call. Both funnel into the
//! same materialization primitive, which is serialized by the unique index on
//! the transaction reference.

use crate::{
    config::AppConfig,
    entities::{order, tenant, user},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{signature, PaymentGateway, TransactionMetadata, WebhookEvent},
    services::orders::{NewOrder, OrderLedgerService},
    services::pricing,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const CHARGE_SUCCESS: &str = "charge.success";

/// What a webhook delivery amounted to. `Ignored` is still an acknowledged
/// delivery; the gateway must not retry it.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Handled { order: order::Model, created: bool },
    Ignored { reason: &'static str },
}

#[derive(Clone)]
pub struct ConfirmationService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<OrderLedgerService>,
    event_sender: Arc<EventSender>,
    config: AppConfig,
}

impl ConfirmationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<OrderLedgerService>,
        event_sender: Arc<EventSender>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            ledger,
            event_sender,
            config,
        }
    }

    /// Processes a raw webhook delivery.
    ///
    /// The signature is checked over the exact raw bytes before anything is
    /// parsed; a missing or invalid signature is rejected outright. After
    /// authentication, deliveries this service cannot act on (unknown event
    /// types, payloads without metadata) are acknowledged as ignored so the
    /// gateway stops retrying them. Only transient failures (database,
    /// missing referenced rows) surface as errors, which the endpoint maps to
    /// a retryable status.
    #[instrument(skip(self, raw_body, signature_header))]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<WebhookOutcome, ServiceError> {
        let provided = signature_header.ok_or_else(|| {
            ServiceError::BadRequest("Missing webhook signature".to_string())
        })?;
        if !signature::verify(raw_body, provided, &self.config.paystack_secret_key) {
            warn!("Webhook signature verification failed");
            return Err(ServiceError::BadRequest(
                "Invalid webhook signature".to_string(),
            ));
        }

        // Authenticated but unparseable payloads will not improve on retry.
        let event: WebhookEvent = match serde_json::from_slice(raw_body) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Discarding malformed webhook payload");
                return Ok(WebhookOutcome::Ignored {
                    reason: "malformed payload",
                });
            }
        };

        if event.event != CHARGE_SUCCESS {
            info!(event = %event.event, "Ignoring webhook event type");
            return Ok(WebhookOutcome::Ignored {
                reason: "unhandled event type",
            });
        }

        let Some(metadata) = event.data.metadata else {
            warn!(reference = %event.data.reference, "charge.success without metadata");
            return Ok(WebhookOutcome::Ignored {
                reason: "missing metadata",
            });
        };
        if metadata.products.is_empty() {
            warn!(reference = %event.data.reference, "charge.success with empty product list");
            return Ok(WebhookOutcome::Ignored {
                reason: "empty product list",
            });
        }

        let (order, created) = self
            .materialize(
                &metadata,
                &event.data.reference,
                event.data.id.map(|id| id.to_string()),
                event.data.amount,
            )
            .await?;

        Ok(WebhookOutcome::Handled { order, created })
    }

    /// Verifies a transaction against the gateway and materializes the order
    /// on success. This is the redirect-driven confirmation path; it races
    /// freely with the webhook.
    #[instrument(skip(self))]
    pub async fn verify_and_materialize(
        &self,
        reference: &str,
    ) -> Result<order::Model, ServiceError> {
        // Cheap fast path: a previous trigger may already have settled this.
        if let Some(existing) = self.ledger.find_by_reference(reference).await? {
            let _ = self
                .event_sender
                .send(Event::DuplicateConfirmation {
                    reference: reference.to_string(),
                })
                .await;
            return Ok(existing);
        }

        let verified = self.gateway.verify_transaction(reference).await?;

        if !verified.is_success() {
            let _ = self
                .event_sender
                .send(Event::PaymentFailed {
                    reference: reference.to_string(),
                    gateway_status: verified.status.clone(),
                })
                .await;
            return Err(ServiceError::PaymentFailed(format!(
                "Transaction {} not successful: {}",
                reference, verified.status
            )));
        }

        let metadata = verified.metadata.ok_or_else(|| {
            ServiceError::InternalError(format!(
                "verified transaction {} carries no metadata",
                reference
            ))
        })?;

        let (order, _created) = self
            .materialize(
                &metadata,
                &verified.reference,
                verified.id.map(|id| id.to_string()),
                verified.amount,
            )
            .await?;

        Ok(order)
    }

    /// The single materialization primitive shared by both triggers. The
    /// amount recorded is the gateway's settled amount, not a re-priced one;
    /// money has already moved by the time this runs.
    async fn materialize(
        &self,
        metadata: &TransactionMetadata,
        reference: &str,
        transaction_id: Option<String>,
        amount_minor: i64,
    ) -> Result<(order::Model, bool), ServiceError> {
        let user = user::Entity::find_by_id(metadata.user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "confirmed transaction references unknown user {}",
                    metadata.user_id
                ))
            })?;

        let tenant = tenant::Entity::find_by_id(metadata.tenant_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "confirmed transaction references unknown tenant {}",
                    metadata.tenant_id
                ))
            })?;

        self.warn_on_vanished_products(metadata, reference).await?;

        let (order, created) = self
            .ledger
            .insert_if_absent(NewOrder {
                tenant_id: tenant.id,
                user_id: user.id,
                product_ids: metadata.products.iter().map(|p| p.id).collect(),
                product_names: metadata.products.iter().map(|p| p.name.clone()).collect(),
                paystack_reference: reference.to_string(),
                paystack_transaction_id: transaction_id,
                total_amount: pricing::from_minor_units(amount_minor),
                currency: self.config.currency.clone(),
            })
            .await?;

        let event = if created {
            Event::OrderMaterialized {
                order_id: order.id,
                tenant_id: tenant.id,
                user_id: user.id,
                reference: reference.to_string(),
            }
        } else {
            Event::DuplicateConfirmation {
                reference: reference.to_string(),
            }
        };
        let _ = self.event_sender.send(event).await;

        Ok((order, created))
    }

    /// The catalog may have changed since initiation. The order is recorded
    /// from the transaction metadata regardless; this only flags the drift.
    async fn warn_on_vanished_products(
        &self,
        metadata: &TransactionMetadata,
        reference: &str,
    ) -> Result<(), ServiceError> {
        use crate::entities::product;

        let ids: Vec<_> = metadata.products.iter().map(|p| p.id).collect();
        let found = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.clone()))
            .all(&*self.db)
            .await?;
        if found.len() != ids.len() {
            warn!(
                reference,
                expected = ids.len(),
                found = found.len(),
                "Confirmed transaction references products no longer in catalog"
            );
        }
        Ok(())
    }
}
