use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.3.0",
        description = r#"
# Storefront Marketplace API

Backend for a multi-tenant digital marketplace: tenant storefront checkout,
Paystack payment confirmation, order ledger and buyer library access.

## Checkout flow

1. The storefront posts the cart to `/checkout/{tenant_slug}/purchase` and
   redirects the buyer to the returned `authorization_url`.
2. Paystack confirms the charge via `/payments/webhook` (HMAC-SHA512 signed)
   and redirects the buyer back, after which the storefront calls
   `/checkout/verify/{reference}`.
3. Both confirmation paths materialize at most one order per transaction
   reference.

## Authentication

Buyer-scoped endpoints read the `x-user-id` header injected by the
session-terminating edge. The payment webhook is authenticated by its
signature instead.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Checkout", description = "Transaction initiation and verification"),
        (name = "Payments", description = "Gateway webhook"),
        (name = "Products", description = "Catalog lookups for storefront carts"),
        (name = "Library", description = "Purchased content access"),
        (name = "Tenants", description = "Tenant registration and payment onboarding")
    ),
    paths(
        crate::handlers::checkout::initiate_purchase,
        crate::handlers::checkout::verify_purchase,
        crate::handlers::webhooks::paystack_webhook,
        crate::handlers::products::get_products_by_ids,
        crate::handlers::products::get_product,
        crate::handlers::library::list_library,
        crate::handlers::library::check_access,
        crate::handlers::library::purchase_history,
        crate::handlers::tenants::register_tenant,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::submit_payment_details,
        crate::handlers::tenants::tenant_orders,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::cart::CartLineItem,
            crate::handlers::checkout::PurchaseRequest,
            crate::handlers::checkout::CheckoutSessionResponse,
            crate::handlers::checkout::VerifyResponse,
            crate::handlers::common::OrderSummary,
            crate::handlers::products::ProductResponse,
            crate::handlers::products::VariantResponse,
            crate::handlers::products::ProductDetailResponse,
            crate::handlers::products::PricedProductsResponse,
            crate::handlers::library::AccessResponse,
            crate::handlers::tenants::RegisterTenantRequest,
            crate::handlers::tenants::TenantResponse,
            crate::services::tenants::PaymentDetails,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/api/v1/payments/webhook"));
        assert!(json.contains("/api/v1/checkout/{tenant_slug}/purchase"));
    }
}
