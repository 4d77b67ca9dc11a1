//! Paystack payment gateway client.
//!
//! The gateway is reached through the [`PaymentGateway`] trait so services can
//! be exercised against a mock in tests. [`PaystackClient`] is the production
//! implementation over `reqwest`.
//!
//! `verify_transaction` is an idempotent read and retries transient transport
//! failures with bounded backoff. `initialize_transaction` is NOT idempotent
//! gateway-side and is never retried.

pub mod signature;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument, warn};
use uuid::Uuid;

/// Metadata embedded into a gateway transaction at initialization and read
/// back verbatim on confirmation. Field names are camelCase on the wire to
/// match what storefront clients and the gateway dashboard display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub products: Vec<MetadataProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataProduct {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Request for the gateway's "initialize transaction" operation.
/// `amount` is in minor currency units (kobo for NGN).
#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransactionRequest {
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub subaccount: String,
    /// Overridden to 0 so the gateway's own percentage split (configured on
    /// the subaccount) governs the platform fee.
    pub transaction_charge: i64,
    pub callback_url: String,
    pub metadata: TransactionMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Authoritative transaction state fetched from the gateway's verify
/// endpoint. `amount` is in minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedTransaction {
    pub id: Option<i64>,
    pub status: String,
    pub reference: String,
    pub amount: i64,
    pub metadata: Option<TransactionMetadata>,
}

impl VerifiedTransaction {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveAccountRequest {
    pub account_number: String,
    pub bank_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSubaccountRequest {
    pub business_name: String,
    pub bank_code: String,
    pub account_number: String,
    /// Percentage of each split transaction retained by the platform account.
    pub percentage_charge: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSubaccount {
    pub subaccount_code: String,
    pub account_number: String,
}

/// Inbound webhook envelope: `{ event, data }`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub id: Option<i64>,
    pub reference: String,
    /// Minor currency units.
    pub amount: i64,
    pub status: Option<String>,
    pub metadata: Option<TransactionMetadata>,
}

/// Seam between checkout/confirmation services and the remote gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        request: InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, ServiceError>;

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, ServiceError>;

    async fn resolve_account(
        &self,
        request: ResolveAccountRequest,
    ) -> Result<ResolvedAccount, ServiceError>;

    async fn create_subaccount(
        &self,
        request: CreateSubaccountRequest,
    ) -> Result<CreatedSubaccount, ServiceError>;
}

/// Paystack response envelope: `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

/// Production gateway client backed by the Paystack REST API.
#[derive(Debug, Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    verify_retries: u32,
    retry_backoff: Duration,
}

impl PaystackClient {
    pub fn new(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.gateway_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: cfg.paystack_base_url.trim_end_matches('/').to_string(),
            secret_key: cfg.paystack_secret_key.clone(),
            verify_retries: cfg.gateway_verify_retries,
            retry_backoff: Duration::from_millis(cfg.gateway_retry_backoff_ms),
        })
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(path, error = %e, "Gateway request failed");
                ServiceError::ExternalApiError(format!("gateway unreachable: {}", e))
            })?;

        Self::unwrap_envelope(path, response).await
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!(path, error = %e, "Gateway request failed");
                ServiceError::ExternalApiError(format!("gateway unreachable: {}", e))
            })?;

        Self::unwrap_envelope(path, response).await
    }

    async fn unwrap_envelope<T: for<'de> Deserialize<'de>>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let envelope: PaystackEnvelope<T> = response.json().await.map_err(|e| {
            error!(path, error = %e, "Gateway returned malformed response");
            ServiceError::ExternalApiError(format!("malformed gateway response: {}", e))
        })?;

        if !status.is_success() || !envelope.status {
            error!(
                path,
                http_status = status.as_u16(),
                upstream_message = %envelope.message,
                "Gateway rejected request"
            );
            return Err(ServiceError::ExternalApiError(envelope.message));
        }

        envelope.data.ok_or_else(|| {
            ServiceError::ExternalApiError("gateway response missing data".to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[instrument(skip(self, request), fields(email = %request.email, amount = request.amount))]
    async fn initialize_transaction(
        &self,
        request: InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, ServiceError> {
        // Never retried: each call creates a new transaction gateway-side.
        self.post_json("/transaction/initialize", &request).await
    }

    #[instrument(skip(self))]
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, ServiceError> {
        let path = format!("/transaction/verify/{}", reference);

        let mut attempt = 0u32;
        loop {
            match self.get_json::<VerifiedTransaction>(&path).await {
                Ok(verified) => return Ok(verified),
                Err(err) => {
                    // Only transport-level failures are worth retrying; an
                    // explicit gateway rejection will not change on replay.
                    let transient = matches!(&err, ServiceError::ExternalApiError(msg)
                        if msg.starts_with("gateway unreachable"));
                    if !transient || attempt >= self.verify_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let backoff = self.retry_backoff * attempt;
                    warn!(
                        reference,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying transaction verification"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    #[instrument(skip(self, request), fields(bank_code = %request.bank_code))]
    async fn resolve_account(
        &self,
        request: ResolveAccountRequest,
    ) -> Result<ResolvedAccount, ServiceError> {
        let path = format!(
            "/bank/resolve?account_number={}&bank_code={}",
            request.account_number, request.bank_code
        );
        self.get_json(&path).await
    }

    #[instrument(skip(self, request), fields(business_name = %request.business_name))]
    async fn create_subaccount(
        &self,
        request: CreateSubaccountRequest,
    ) -> Result<CreatedSubaccount, ServiceError> {
        self.post_json("/subaccount", &request).await
    }
}
