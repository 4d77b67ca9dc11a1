//! Authoritative price resolution.
//!
//! Client-supplied prices are never trusted: every purchase re-resolves unit
//! prices from the catalog. A variant's `variant_price` overrides the product
//! base price when the product has variants and the referenced variant
//! declares one; a variant id that does not resolve falls back to the base
//! price. Product ids that do not resolve at all are excluded from the total
//! and reported back so the caller can decide whether to fail.

use crate::{
    entities::{product, product_variant},
    errors::ServiceError,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// One (product, variant?) pair to price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuery {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
}

/// A fully resolved line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Result of a pricing pass: resolved lines, their sum, and any product ids
/// that did not resolve against the catalog.
#[derive(Debug, Clone, Default)]
pub struct PricingOutcome {
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
    pub missing: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct PricingService {
    db: Arc<DatabaseConnection>,
}

impl PricingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves prices for the given queries against non-archived products.
    #[instrument(skip(self, queries), fields(query_count = queries.len()))]
    pub async fn resolve(&self, queries: &[PriceQuery]) -> Result<PricingOutcome, ServiceError> {
        if queries.is_empty() {
            return Ok(PricingOutcome::default());
        }

        let product_ids: Vec<Uuid> = queries.iter().map(|q| q.product_id).collect();
        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids.clone()))
            .filter(product::Column::IsArchived.eq(false))
            .all(&*self.db)
            .await?;

        let variants = product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.is_in(product_ids))
            .all(&*self.db)
            .await?;

        Ok(resolve_lines(&products, &variants, queries))
    }
}

/// Pure resolution over an already-loaded catalog slice.
pub fn resolve_lines(
    products: &[product::Model],
    variants: &[product_variant::Model],
    queries: &[PriceQuery],
) -> PricingOutcome {
    let by_id: HashMap<Uuid, &product::Model> = products.iter().map(|p| (p.id, p)).collect();
    let variants_by_id: HashMap<Uuid, &product_variant::Model> =
        variants.iter().map(|v| (v.id, v)).collect();

    let mut outcome = PricingOutcome::default();

    for query in queries {
        let Some(product) = by_id.get(&query.product_id) else {
            outcome.missing.push(query.product_id);
            continue;
        };

        let (unit_price, variant_name) = resolve_unit_price(product, &variants_by_id, query);
        let line_total = unit_price * Decimal::from(query.quantity);

        outcome.total += line_total;
        outcome.lines.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            variant_id: query.variant_id,
            variant_name,
            unit_price,
            quantity: query.quantity,
            line_total,
        });
    }

    outcome
}

fn resolve_unit_price(
    product: &product::Model,
    variants_by_id: &HashMap<Uuid, &product_variant::Model>,
    query: &PriceQuery,
) -> (Decimal, Option<String>) {
    if product.has_variants {
        if let Some(variant_id) = query.variant_id {
            if let Some(variant) = variants_by_id
                .get(&variant_id)
                .filter(|v| v.product_id == product.id)
            {
                if let Some(price) = variant.variant_price {
                    return (price, Some(variant.display_name()));
                }
                // Variant exists but declares no price: base price applies.
                return (product.price, Some(variant.display_name()));
            }
        }
    }
    (product.price, None)
}

/// Converts a major-unit amount to the gateway's minor units (kobo).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(MINOR_UNITS_PER_MAJOR))
        .round()
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!("amount {} overflows minor units", amount))
        })
}

/// Converts a gateway minor-unit amount back to major units.
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::from(amount) / Decimal::from(MINOR_UNITS_PER_MAJOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(id: Uuid, price: Decimal, has_variants: bool) -> product::Model {
        product::Model {
            id,
            tenant_id: Uuid::new_v4(),
            name: "Product".into(),
            description: None,
            price,
            is_archived: false,
            has_variants,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn variant(id: Uuid, product_id: Uuid, price: Option<Decimal>) -> product_variant::Model {
        product_variant::Model {
            id,
            product_id,
            color: None,
            size: Some("L".into()),
            variant_price: price,
            stock: 10,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn query(product_id: Uuid, variant_id: Option<Uuid>) -> PriceQuery {
        PriceQuery {
            product_id,
            variant_id,
            quantity: 1,
        }
    }

    #[test]
    fn variant_price_overrides_base() {
        let product_id = Uuid::new_v4();
        let variant_id = Uuid::new_v4();
        let products = vec![product(product_id, dec!(3000), true)];
        let variants = vec![variant(variant_id, product_id, Some(dec!(5000)))];

        let outcome = resolve_lines(&products, &variants, &[query(product_id, Some(variant_id))]);

        assert_eq!(outcome.total, dec!(5000));
        assert_eq!(outcome.lines[0].unit_price, dec!(5000));
        assert_eq!(outcome.lines[0].variant_name.as_deref(), Some("L"));
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn unknown_variant_falls_back_to_base_price() {
        let product_id = Uuid::new_v4();
        let products = vec![product(product_id, dec!(3000), true)];

        let outcome = resolve_lines(&products, &[], &[query(product_id, Some(Uuid::new_v4()))]);

        assert_eq!(outcome.total, dec!(3000));
    }

    #[test]
    fn priceless_variant_uses_base_price_but_keeps_name() {
        let product_id = Uuid::new_v4();
        let variant_id = Uuid::new_v4();
        let products = vec![product(product_id, dec!(1200), true)];
        let variants = vec![variant(variant_id, product_id, None)];

        let outcome = resolve_lines(&products, &variants, &[query(product_id, Some(variant_id))]);

        assert_eq!(outcome.total, dec!(1200));
        assert!(outcome.lines[0].variant_name.is_some());
    }

    #[test]
    fn variant_of_another_product_is_ignored() {
        let product_id = Uuid::new_v4();
        let other_product = Uuid::new_v4();
        let variant_id = Uuid::new_v4();
        let products = vec![product(product_id, dec!(700), true)];
        let variants = vec![variant(variant_id, other_product, Some(dec!(9999)))];

        let outcome = resolve_lines(&products, &variants, &[query(product_id, Some(variant_id))]);

        assert_eq!(outcome.total, dec!(700));
    }

    #[test]
    fn unknown_product_is_reported_not_summed() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let products = vec![product(known, dec!(1000), false)];

        let outcome = resolve_lines(
            &products,
            &[],
            &[query(known, None), query(unknown, None)],
        );

        assert_eq!(outcome.total, dec!(1000));
        assert_eq!(outcome.missing, vec![unknown]);
        assert_eq!(outcome.lines.len(), 1);
    }

    #[test]
    fn quantity_multiplies_line_totals() {
        let product_id = Uuid::new_v4();
        let products = vec![product(product_id, dec!(250), false)];

        let outcome = resolve_lines(
            &products,
            &[],
            &[PriceQuery {
                product_id,
                variant_id: None,
                quantity: 4,
            }],
        );
        assert_eq!(outcome.total, dec!(1000));
        assert_eq!(outcome.lines[0].line_total, dec!(1000));
    }

    #[test]
    fn minor_unit_conversion_round_trips() {
        assert_eq!(to_minor_units(dec!(5000)).unwrap(), 500_000);
        assert_eq!(to_minor_units(dec!(19.99)).unwrap(), 1999);
        assert_eq!(from_minor_units(500_000), dec!(5000));
        assert_eq!(from_minor_units(1999), dec!(19.99));
    }
}
