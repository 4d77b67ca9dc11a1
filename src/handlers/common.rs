use crate::errors::ServiceError;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::order;

/// Identity of the authenticated buyer, taken from the `x-user-id` header
/// that the session-terminating edge injects after validating the session.
/// A missing or malformed header rejects with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing user identity".to_string()))?;

        let user_id = Uuid::parse_str(header)
            .map_err(|_| ServiceError::Unauthorized("Invalid user identity".to_string()))?;

        Ok(AuthUser(user_id))
    }
}

/// Order representation shared by the library and tenant reporting endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub reference: String,
    pub product_names: Vec<String>,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderSummary {
    fn from(order: order::Model) -> Self {
        let product_names = order
            .product_names
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: order.id,
            order_number: order.order_number,
            reference: order.paystack_reference,
            product_names,
            total_amount: order.total_amount,
            currency: order.currency,
            status: format!("{:?}", order.status).to_lowercase(),
            created_at: order.created_at,
        }
    }
}
