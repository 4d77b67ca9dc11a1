//! The order ledger: append-mostly store of completed purchases, keyed by the
//! gateway's transaction reference.
//!
//! `insert_if_absent` is the single idempotent primitive every confirmation
//! trigger converges on. Concurrent callers are serialized by the unique
//! index on `paystack_reference`; a uniqueness violation is swallowed as the
//! no-op case, never surfaced as an error.

use crate::{
    entities::order::{self, OrderStatus},
    errors::ServiceError,
};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Input for materializing one order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub product_ids: Vec<Uuid>,
    pub product_names: Vec<String>,
    pub paystack_reference: String,
    pub paystack_transaction_id: Option<String>,
    pub total_amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct OrderLedgerService {
    db: Arc<DatabaseConnection>,
}

impl OrderLedgerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates the order for `new_order.paystack_reference` if and only if no
    /// order with that reference exists. Returns the order and whether this
    /// call created it.
    ///
    /// The pre-existence check keeps the common redelivery path cheap; the
    /// unique index closes the race window between check and insert.
    #[instrument(skip(self, new_order), fields(reference = %new_order.paystack_reference))]
    pub async fn insert_if_absent(
        &self,
        new_order: NewOrder,
    ) -> Result<(order::Model, bool), ServiceError> {
        if let Some(existing) = self
            .find_by_reference(&new_order.paystack_reference)
            .await?
        {
            return Ok((existing, false));
        }

        let reference = new_order.paystack_reference.clone();
        let now = Utc::now();
        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(generate_order_number()),
            tenant_id: Set(new_order.tenant_id),
            user_id: Set(new_order.user_id),
            product_ids: Set(serde_json::to_value(&new_order.product_ids)?),
            product_names: Set(serde_json::to_value(&new_order.product_names)?),
            paystack_reference: Set(new_order.paystack_reference),
            paystack_transaction_id: Set(new_order.paystack_transaction_id),
            status: Set(OrderStatus::Success),
            total_amount: Set(new_order.total_amount),
            currency: Set(new_order.currency),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        match model.insert(&*self.db).await {
            Ok(order) => {
                info!(order_id = %order.id, "Order created");
                Ok((order, true))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // A concurrent trigger won the race; treat as the no-op case.
                warn!(reference = %reference, "Lost materialization race, reusing existing order");
                let existing = self.find_by_reference(&reference).await?.ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "order for reference {} vanished after uniqueness conflict",
                        reference
                    ))
                })?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Looks up an order by its gateway transaction reference.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::PaystackReference.eq(reference))
            .one(&*self.db)
            .await?)
    }

    /// All successful orders for a user, newest first.
    pub async fn successful_orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::Status.eq(OrderStatus::Success))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// All orders for a tenant, newest first. Administrative reporting.
    pub async fn orders_for_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::TenantId.eq(tenant_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}

fn generate_order_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("ORD-{}", suffix)
}
