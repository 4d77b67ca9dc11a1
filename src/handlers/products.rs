use crate::{
    entities::{product, product_variant},
    errors::ServiceError,
    services::pricing::PriceQuery,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub has_variants: bool,
}

impl From<product::Model> for ProductResponse {
    fn from(product: product::Model) -> Self {
        Self {
            id: product.id,
            tenant_id: product.tenant_id,
            name: product.name,
            description: product.description,
            price: product.price,
            has_variants: product.has_variants,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub name: String,
    pub price: Option<Decimal>,
    pub stock: i32,
}

impl From<product_variant::Model> for VariantResponse {
    fn from(variant: product_variant::Model) -> Self {
        Self {
            id: variant.id,
            name: variant.display_name(),
            price: variant.variant_price,
            stock: variant.stock,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub variants: Vec<VariantResponse>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductsByIdsQuery {
    /// Comma-separated product ids
    pub ids: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricedProductsResponse {
    pub products: Vec<ProductResponse>,
    /// Authoritative sum of the listed products' current prices.
    pub total_price: Decimal,
}

/// GET /api/v1/products?ids=...
///
/// Batch lookup used by storefront carts to display current catalog data and
/// an authoritative total for the ids the client holds. Archived or deleted
/// products are silently absent from the response.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductsByIdsQuery),
    responses(
        (status = 200, description = "Products with authoritative total"),
        (status = 400, description = "Malformed id list", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_products_by_ids(
    State(state): State<AppState>,
    Query(query): Query<ProductsByIdsQuery>,
) -> ApiResult<PricedProductsResponse> {
    let ids = parse_id_list(&query.ids)?;

    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(ids.clone()))
        .filter(product::Column::IsArchived.eq(false))
        .all(&*state.db)
        .await?;

    let queries: Vec<PriceQuery> = products
        .iter()
        .map(|p| PriceQuery {
            product_id: p.id,
            variant_id: None,
            quantity: 1,
        })
        .collect();
    let outcome = state.services.pricing.resolve(&queries).await?;

    Ok(Json(ApiResponse::success(PricedProductsResponse {
        products: products.into_iter().map(Into::into).collect(),
        total_price: outcome.total,
    })))
}

/// GET /api/v1/products/{id}
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with variants"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductDetailResponse> {
    let product = product::Entity::find_by_id(id)
        .filter(product::Column::IsArchived.eq(false))
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

    let variants = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.eq(product.id))
        .all(&*state.db)
        .await?;

    Ok(Json(ApiResponse::success(ProductDetailResponse {
        product: product.into(),
        variants: variants.into_iter().map(Into::into).collect(),
    })))
}

fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, ServiceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ServiceError::InvalidInput(format!("invalid product id: {}", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parsing() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_id_list(&format!("{}, {} ,", a, b)).unwrap();
        assert_eq!(parsed, vec![a, b]);

        assert!(parse_id_list("not-a-uuid").is_err());
        assert!(parse_id_list("").unwrap().is_empty());
    }
}
