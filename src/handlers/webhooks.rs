use crate::{errors::ServiceError, services::confirmation::WebhookOutcome, AppState};
use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use bytes::Bytes;
use tracing::info;

const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// POST /api/v1/payments/webhook
///
/// The gateway's confirmation callback. Signature-verified over the raw body;
/// no session auth. Response codes drive the gateway's retry behavior: 200
/// acknowledges (handled or deliberately ignored), 400 rejects permanently,
/// 5xx asks for redelivery.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Delivery acknowledged"),
        (status = 400, description = "Missing or invalid signature", body = crate::errors::ErrorResponse),
        (status = 500, description = "Transient failure, gateway should retry", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state
        .services
        .confirmation
        .handle_webhook(&body, signature)
        .await?
    {
        WebhookOutcome::Handled { order, created } => {
            info!(
                order_id = %order.id,
                reference = %order.paystack_reference,
                created,
                "Webhook processed"
            );
        }
        WebhookOutcome::Ignored { reason } => {
            info!(reason, "Webhook acknowledged without action");
        }
    }

    Ok((StatusCode::OK, "ok"))
}
