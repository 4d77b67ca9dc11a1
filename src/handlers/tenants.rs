use crate::{
    entities::tenant,
    errors::ServiceError,
    handlers::common::OrderSummary,
    services::tenants::PaymentDetails,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterTenantRequest {
    #[validate(length(min = 3, max = 63, message = "Slug must be 3-63 characters"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub payment_enabled: bool,
}

impl From<tenant::Model> for TenantResponse {
    fn from(tenant: tenant::Model) -> Self {
        let payment_enabled = tenant.is_payment_enabled();
        Self {
            id: tenant.id,
            slug: tenant.slug,
            name: tenant.name,
            payment_enabled,
        }
    }
}

/// POST /api/v1/tenants
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = RegisterTenantRequest,
    responses(
        (status = 200, description = "Tenant registered"),
        (status = 400, description = "Invalid slug or name", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Tenants"
)]
pub async fn register_tenant(
    State(state): State<AppState>,
    Json(request): Json<RegisterTenantRequest>,
) -> ApiResult<TenantResponse> {
    request.validate()?;

    let tenant = state
        .services
        .onboarding
        .register_tenant(&request.slug, &request.name)
        .await?;

    Ok(Json(ApiResponse::success(tenant.into())))
}

/// GET /api/v1/tenants/{slug}
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{slug}",
    params(("slug" = String, Path, description = "Tenant storefront slug")),
    responses(
        (status = 200, description = "Tenant details"),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<TenantResponse> {
    let tenant = state
        .services
        .onboarding
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Tenant with slug {} not found", slug)))?;

    Ok(Json(ApiResponse::success(tenant.into())))
}

/// POST /api/v1/tenants/{slug}/payment-details
#[utoipa::path(
    post,
    path = "/api/v1/tenants/{slug}/payment-details",
    params(("slug" = String, Path, description = "Tenant storefront slug")),
    request_body = PaymentDetails,
    responses(
        (status = 200, description = "Subaccount provisioned, tenant payment-enabled"),
        (status = 400, description = "Bank account could not be resolved", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Details already submitted", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Tenants"
)]
pub async fn submit_payment_details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(details): Json<PaymentDetails>,
) -> ApiResult<TenantResponse> {
    let tenant = state
        .services
        .onboarding
        .submit_payment_details(&slug, details)
        .await?;

    Ok(Json(ApiResponse::success(tenant.into())))
}

/// GET /api/v1/tenants/{slug}/orders
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{slug}/orders",
    params(("slug" = String, Path, description = "Tenant storefront slug")),
    responses(
        (status = 200, description = "Tenant order ledger, newest first"),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Tenants"
)]
pub async fn tenant_orders(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Vec<OrderSummary>> {
    let tenant = state
        .services
        .onboarding
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Tenant with slug {} not found", slug)))?;

    let orders = state.services.ledger.orders_for_tenant(tenant.id).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(Into::into).collect(),
    )))
}
