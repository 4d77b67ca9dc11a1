//! Storefront API Library
//!
//! Multi-tenant marketplace backend: checkout initiation, payment
//! confirmation, order ledger and library access.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let checkout = Router::new()
        .route(
            "/checkout/{tenant_slug}/purchase",
            axum::routing::post(handlers::checkout::initiate_purchase),
        )
        .route(
            "/checkout/verify/{reference}",
            get(handlers::checkout::verify_purchase),
        );

    let products = Router::new()
        .route("/products", get(handlers::products::get_products_by_ids))
        .route("/products/{id}", get(handlers::products::get_product));

    let library = Router::new()
        .route("/library", get(handlers::library::list_library))
        .route("/library/orders", get(handlers::library::purchase_history))
        .route(
            "/library/{product_id}/access",
            get(handlers::library::check_access),
        );

    let tenants = Router::new()
        .route(
            "/tenants",
            axum::routing::post(handlers::tenants::register_tenant),
        )
        .route("/tenants/{slug}", get(handlers::tenants::get_tenant))
        .route(
            "/tenants/{slug}/payment-details",
            axum::routing::post(handlers::tenants::submit_payment_details),
        )
        .route(
            "/tenants/{slug}/orders",
            get(handlers::tenants::tenant_orders),
        );

    // Signature-verified, no session auth
    let payment_webhook = Router::new().route(
        "/payments/webhook",
        axum::routing::post(handlers::webhooks::paystack_webhook),
    );

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(checkout)
        .merge(products)
        .merge(library)
        .merge(tenants)
        .merge(payment_webhook)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "storefront-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
