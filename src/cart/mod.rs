//! Client-held cart state, modeled as a repository with an injected
//! persistence backend rather than an ambient global store.
//!
//! Carts are scoped per tenant and never trusted server-side: the transaction
//! initiator re-resolves every price against the catalog before any money
//! moves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// One line in a tenant's cart, keyed by (product_id, variant_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub quantity: i32,
}

impl CartLineItem {
    pub fn key(&self) -> (Uuid, Option<Uuid>) {
        (self.product_id, self.variant_id)
    }
}

/// Storage seam for cart state. The in-memory backend serves tests and
/// single-process deployments; a durable backend can be swapped in without
/// touching callers.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Adds a line item to a tenant's cart. Re-adding the same
    /// (product, variant) key replaces the existing line.
    async fn add_item(&self, tenant_slug: &str, item: CartLineItem);

    /// Removes the line matching (product_id, variant_id), if present.
    async fn remove_item(&self, tenant_slug: &str, product_id: Uuid, variant_id: Option<Uuid>);

    /// Drops every line in a tenant's cart.
    async fn clear_cart(&self, tenant_slug: &str);

    /// Drops all carts across tenants.
    async fn clear_all(&self);

    /// Current lines in a tenant's cart, in insertion order.
    async fn items(&self, tenant_slug: &str) -> Vec<CartLineItem>;

    /// Whether the (product, variant) pair is already in the tenant's cart.
    async fn contains(&self, tenant_slug: &str, product_id: Uuid, variant_id: Option<Uuid>)
        -> bool;

    /// Total quantity across all lines of a tenant's cart.
    async fn total_quantity(&self, tenant_slug: &str) -> i32;
}

/// In-memory cart backend.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartLineItem>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn add_item(&self, tenant_slug: &str, item: CartLineItem) {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(tenant_slug.to_string()).or_default();
        if let Some(existing) = cart.iter_mut().find(|line| line.key() == item.key()) {
            *existing = item;
        } else {
            cart.push(item);
        }
    }

    async fn remove_item(&self, tenant_slug: &str, product_id: Uuid, variant_id: Option<Uuid>) {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(tenant_slug) {
            cart.retain(|line| line.key() != (product_id, variant_id));
        }
    }

    async fn clear_cart(&self, tenant_slug: &str) {
        let mut carts = self.carts.write().await;
        carts.remove(tenant_slug);
    }

    async fn clear_all(&self) {
        let mut carts = self.carts.write().await;
        carts.clear();
    }

    async fn items(&self, tenant_slug: &str) -> Vec<CartLineItem> {
        let carts = self.carts.read().await;
        carts.get(tenant_slug).cloned().unwrap_or_default()
    }

    async fn contains(
        &self,
        tenant_slug: &str,
        product_id: Uuid,
        variant_id: Option<Uuid>,
    ) -> bool {
        let carts = self.carts.read().await;
        carts
            .get(tenant_slug)
            .map(|cart| {
                cart.iter()
                    .any(|line| line.key() == (product_id, variant_id))
            })
            .unwrap_or(false)
    }

    async fn total_quantity(&self, tenant_slug: &str) -> i32 {
        let carts = self.carts.read().await;
        carts
            .get(tenant_slug)
            .map(|cart| cart.iter().map(|line| line.quantity).sum())
            .unwrap_or(0)
    }
}
