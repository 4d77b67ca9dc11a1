//! Transaction initiation: validates a purchase request against the tenant
//! and catalog, computes the authoritative total, and asks the gateway for a
//! hosted checkout URL. All preconditions run before the gateway call, so a
//! failed request has no side effects anywhere.

use crate::{
    cart::CartLineItem,
    config::AppConfig,
    entities::{product, tenant, user},
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{
        InitializeTransactionRequest, MetadataProduct, PaymentGateway, TransactionMetadata,
    },
    services::pricing::{self, PriceQuery, PricingService},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of a successful initiation: where to send the buyer.
#[derive(Debug, Clone)]
pub struct PurchaseSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    pricing: Arc<PricingService>,
    event_sender: Arc<EventSender>,
    config: AppConfig,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        pricing: Arc<PricingService>,
        event_sender: Arc<EventSender>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            pricing,
            event_sender,
            config,
        }
    }

    /// Initiates a purchase of `items` from the tenant at `tenant_slug` on
    /// behalf of `buyer`.
    ///
    /// Preconditions, checked in order, any failure aborting with no side
    /// effects:
    /// 1. the cart is non-empty and every item quantity is at least 1,
    /// 2. every cart item resolves to a non-archived product owned by the
    ///    tenant (count mismatch is NotFound),
    /// 3. the tenant is payment-enabled (subaccount exists),
    /// 4. the resolved total is strictly positive.
    #[instrument(skip(self, items, buyer), fields(buyer_id = %buyer.id, item_count = items.len()))]
    pub async fn initiate_purchase(
        &self,
        tenant_slug: &str,
        items: &[CartLineItem],
        buyer: &user::Model,
    ) -> Result<PurchaseSession, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Cart must contain at least one item".to_string(),
            ));
        }

        if items.iter().any(|item| item.quantity < 1) {
            return Err(ServiceError::ValidationError(
                "Item quantity must be at least 1".to_string(),
            ));
        }

        let tenant = tenant::Entity::find()
            .filter(tenant::Column::Slug.eq(tenant_slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Tenant with slug {} not found", tenant_slug))
            })?;

        let requested_ids: HashSet<_> = items.iter().map(|item| item.product_id).collect();
        let owned = product::Entity::find()
            .filter(product::Column::Id.is_in(requested_ids.iter().copied().collect::<Vec<_>>()))
            .filter(product::Column::TenantId.eq(tenant.id))
            .filter(product::Column::IsArchived.eq(false))
            .all(&*self.db)
            .await?;

        if owned.len() != requested_ids.len() {
            return Err(ServiceError::NotFound(
                "One or more products no longer exist".to_string(),
            ));
        }

        let subaccount = tenant
            .paystack_subaccount_code
            .clone()
            .filter(|_| tenant.paystack_details_submitted)
            .ok_or_else(|| {
                ServiceError::BadRequest(format!(
                    "Tenant {} is not enabled to receive payments",
                    tenant_slug
                ))
            })?;

        let queries: Vec<PriceQuery> = items
            .iter()
            .map(|item| PriceQuery {
                product_id: item.product_id,
                variant_id: item.variant_id,
                quantity: item.quantity,
            })
            .collect();
        let outcome = self.pricing.resolve(&queries).await?;

        if !outcome.missing.is_empty() {
            // The ownership check above should have caught these; a miss here
            // means the catalog changed mid-request.
            return Err(ServiceError::NotFound(
                "One or more products no longer exist".to_string(),
            ));
        }

        if outcome.total <= rust_decimal::Decimal::ZERO {
            return Err(ServiceError::BadRequest(
                "Order total must be greater than zero".to_string(),
            ));
        }

        let metadata = TransactionMetadata {
            user_id: buyer.id,
            tenant_id: tenant.id,
            products: outcome
                .lines
                .iter()
                .map(|line| MetadataProduct {
                    id: line.product_id,
                    name: line.product_name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                    variant_id: line.variant_id,
                    variant_name: line.variant_name.clone(),
                })
                .collect(),
        };

        let request = InitializeTransactionRequest {
            email: buyer.email.clone(),
            amount: pricing::to_minor_units(outcome.total)?,
            currency: self.config.currency.clone(),
            subaccount,
            // 0 leaves the split to the subaccount's configured percentage.
            transaction_charge: 0,
            callback_url: self.config.tenant_callback_url(&tenant.slug),
            metadata,
        };

        let initialized = self.gateway.initialize_transaction(request).await?;

        info!(
            reference = %initialized.reference,
            tenant_id = %tenant.id,
            total = %outcome.total,
            "Transaction initialized"
        );

        let _ = self
            .event_sender
            .send(Event::CheckoutInitiated {
                tenant_id: tenant.id,
                user_id: buyer.id,
                reference: initialized.reference.clone(),
                total_amount: outcome.total,
            })
            .await;

        Ok(PurchaseSession {
            authorization_url: initialized.authorization_url,
            access_code: initialized.access_code,
            reference: initialized.reference,
        })
    }
}
