//! Library access: what a buyer owns, derived solely from successful orders.
//! Access checks are default-deny; an order in any state other than success
//! grants nothing.

use crate::{
    entities::{order, product},
    errors::ServiceError,
    services::orders::OrderLedgerService,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct LibraryService {
    db: Arc<DatabaseConnection>,
    ledger: Arc<OrderLedgerService>,
}

impl LibraryService {
    pub fn new(db: Arc<DatabaseConnection>, ledger: Arc<OrderLedgerService>) -> Self {
        Self { db, ledger }
    }

    /// Every product the user has successfully purchased, deduplicated across
    /// orders. Products later archived or deleted from the catalog simply no
    /// longer appear.
    #[instrument(skip(self))]
    pub async fn list_purchased(&self, user_id: Uuid) -> Result<Vec<product::Model>, ServiceError> {
        let orders = self.ledger.successful_orders_for_user(user_id).await?;

        let mut seen = HashSet::new();
        let mut product_ids = Vec::new();
        for order in &orders {
            for id in order.product_id_list() {
                if seen.insert(id) {
                    product_ids.push(id);
                }
            }
        }

        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?)
    }

    /// Whether the user owns the given product. Scans the product id lists of
    /// the user's successful orders; anything else denies.
    #[instrument(skip(self))]
    pub async fn has_purchased(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let orders = self.ledger.successful_orders_for_user(user_id).await?;
        Ok(orders
            .iter()
            .any(|order| order.product_id_list().contains(&product_id)))
    }

    /// The successful orders backing a user's library, newest first.
    pub async fn purchase_history(&self, user_id: Uuid) -> Result<Vec<order::Model>, ServiceError> {
        self.ledger.successful_orders_for_user(user_id).await
    }
}
