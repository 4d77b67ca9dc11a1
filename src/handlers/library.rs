use crate::{
    handlers::common::{AuthUser, OrderSummary},
    handlers::products::ProductResponse,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    pub product_id: Uuid,
    pub has_access: bool,
}

/// GET /api/v1/library
#[utoipa::path(
    get,
    path = "/api/v1/library",
    responses(
        (status = 200, description = "Products the user has purchased"),
        (status = 401, description = "Missing user identity", body = crate::errors::ErrorResponse)
    ),
    tag = "Library"
)]
pub async fn list_library(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<ProductResponse>> {
    let products = state.services.library.list_purchased(user_id).await?;
    Ok(Json(ApiResponse::success(
        products.into_iter().map(Into::into).collect(),
    )))
}

/// GET /api/v1/library/{product_id}/access
///
/// Default-deny ownership check used by content delivery.
#[utoipa::path(
    get,
    path = "/api/v1/library/{product_id}/access",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Access decision"),
        (status = 401, description = "Missing user identity", body = crate::errors::ErrorResponse)
    ),
    tag = "Library"
)]
pub async fn check_access(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<AccessResponse> {
    let has_access = state
        .services
        .library
        .has_purchased(user_id, product_id)
        .await?;

    Ok(Json(ApiResponse::success(AccessResponse {
        product_id,
        has_access,
    })))
}

/// GET /api/v1/library/orders
#[utoipa::path(
    get,
    path = "/api/v1/library/orders",
    responses(
        (status = 200, description = "The user's successful orders, newest first"),
        (status = 401, description = "Missing user identity", body = crate::errors::ErrorResponse)
    ),
    tag = "Library"
)]
pub async fn purchase_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<OrderSummary>> {
    let orders = state.services.library.purchase_history(user_id).await?;
    Ok(Json(ApiResponse::success(
        orders.into_iter().map(Into::into).collect(),
    )))
}
