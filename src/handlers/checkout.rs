use crate::{
    cart::CartLineItem,
    entities::user,
    errors::ServiceError,
    handlers::common::{AuthUser, OrderSummary},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PurchaseRequest {
    #[validate(length(min = 1, message = "Cart must contain at least one item"))]
    pub items: Vec<CartLineItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSessionResponse {
    /// Hosted payment page the buyer should be redirected to.
    pub authorization_url: String,
    pub access_code: String,
    /// Gateway transaction reference; also the idempotency key for the order.
    pub reference: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub verified: bool,
    pub order: OrderSummary,
}

/// POST /api/v1/checkout/{tenant_slug}/purchase
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{tenant_slug}/purchase",
    params(("tenant_slug" = String, Path, description = "Tenant storefront slug")),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Transaction initialized"),
        (status = 400, description = "Cart invalid or tenant not payment-enabled", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing user identity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tenant or product not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn initiate_purchase(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(tenant_slug): Path<String>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<CheckoutSessionResponse> {
    request.validate()?;

    let buyer = user::Entity::find_by_id(user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Unknown user".to_string()))?;

    let session = state
        .services
        .checkout
        .initiate_purchase(&tenant_slug, &request.items, &buyer)
        .await?;

    Ok(Json(ApiResponse::success(CheckoutSessionResponse {
        authorization_url: session.authorization_url,
        access_code: session.access_code,
        reference: session.reference,
    })))
}

/// GET /api/v1/checkout/verify/{reference}
///
/// Redirect-driven confirmation: called by the storefront after the gateway
/// sends the buyer back. Races freely with the webhook; at most one order
/// results either way.
#[utoipa::path(
    get,
    path = "/api/v1/checkout/verify/{reference}",
    params(("reference" = String, Path, description = "Gateway transaction reference")),
    responses(
        (status = 200, description = "Transaction verified, order available"),
        (status = 402, description = "Transaction not successful", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment gateway unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn verify_purchase(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<VerifyResponse> {
    let order = state
        .services
        .confirmation
        .verify_and_materialize(&reference)
        .await?;

    Ok(Json(ApiResponse::success(VerifyResponse {
        verified: true,
        order: order.into(),
    })))
}
