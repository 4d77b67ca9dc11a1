mod common;

use axum::http::{Method, StatusCode};
use common::{assert_status, body_json, charge_success_payload, TestApp};
use rust_decimal_macros::dec;
use storefront_api::gateway::{TransactionMetadata, VerifiedTransaction};
use uuid::Uuid;

#[tokio::test]
async fn webhook_materializes_exactly_one_order() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("buyer@example.com").await;
    let tenant = app.seed_tenant("acme", true).await;
    let product = app.seed_product(tenant.id, "Ebook", dec!(5000), false).await;

    let payload = charge_success_payload(
        "T-REF-1",
        buyer.id,
        tenant.id,
        &[(product.id, "Ebook", dec!(5000))],
        500_000,
    );

    let first = app.deliver_signed_webhook(&payload).await;
    assert_status(&first, StatusCode::OK);
    assert_eq!(app.count_orders().await, 1);

    // Gateway redelivery of the same event must be a no-op, still 200.
    let second = app.deliver_signed_webhook(&payload).await;
    assert_status(&second, StatusCode::OK);
    let third = app.deliver_signed_webhook(&payload).await;
    assert_status(&third, StatusCode::OK);
    assert_eq!(app.count_orders().await, 1);

    let order = app
        .state
        .services
        .ledger
        .find_by_reference("T-REF-1")
        .await
        .unwrap()
        .expect("order exists");
    assert_eq!(order.total_amount, dec!(5000));
    assert_eq!(order.user_id, buyer.id);
    assert_eq!(order.tenant_id, tenant.id);
}

#[tokio::test]
async fn tampered_body_is_rejected_without_an_order() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("buyer@example.com").await;
    let tenant = app.seed_tenant("acme", true).await;
    let product = app.seed_product(tenant.id, "Ebook", dec!(5000), false).await;

    let payload = charge_success_payload(
        "T-REF-2",
        buyer.id,
        tenant.id,
        &[(product.id, "Ebook", dec!(5000))],
        500_000,
    );
    let signature = storefront_api::gateway::signature::sign(&payload, common::TEST_SECRET);

    // Flip one byte after signing.
    let mut tampered = payload.clone();
    let last = tampered.len() - 10;
    tampered[last] ^= 0x01;

    let response = app.deliver_webhook(&tampered, Some(&signature)).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.count_orders().await, 0);

    // Missing header entirely is also a 400.
    let response = app.deliver_webhook(&payload, None).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(app.count_orders().await, 0);
}

#[tokio::test]
async fn unhandled_event_types_are_acknowledged_without_an_order() {
    let app = TestApp::new().await;

    let payload = serde_json::to_vec(&serde_json::json!({
        "event": "transfer.success",
        "data": { "reference": "T-REF-3", "amount": 1000 }
    }))
    .unwrap();

    let response = app.deliver_signed_webhook(&payload).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(app.count_orders().await, 0);
}

#[tokio::test]
async fn charge_success_without_metadata_is_ignored() {
    let app = TestApp::new().await;

    let payload = serde_json::to_vec(&serde_json::json!({
        "event": "charge.success",
        "data": { "reference": "T-REF-4", "amount": 1000, "status": "success" }
    }))
    .unwrap();

    let response = app.deliver_signed_webhook(&payload).await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(app.count_orders().await, 0);
}

#[tokio::test]
async fn verify_endpoint_and_webhook_converge_on_one_order() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("buyer@example.com").await;
    let tenant = app.seed_tenant("acme", true).await;
    let product = app.seed_product(tenant.id, "Ebook", dec!(5000), false).await;

    let metadata = TransactionMetadata {
        user_id: buyer.id,
        tenant_id: tenant.id,
        products: vec![storefront_api::gateway::MetadataProduct {
            id: product.id,
            name: "Ebook".into(),
            price: dec!(5000),
            quantity: 1,
            variant_id: None,
            variant_name: None,
        }],
    };
    app.gateway
        .stub_verify(VerifiedTransaction {
            id: Some(42),
            status: "success".into(),
            reference: "T-REF-5".into(),
            amount: 500_000,
            metadata: Some(metadata),
        })
        .await;

    // Webhook lands first.
    let payload = charge_success_payload(
        "T-REF-5",
        buyer.id,
        tenant.id,
        &[(product.id, "Ebook", dec!(5000))],
        500_000,
    );
    let response = app.deliver_signed_webhook(&payload).await;
    assert_status(&response, StatusCode::OK);

    // Redirect-driven verify arrives second and reuses the existing order.
    let response = app
        .request(Method::GET, "/api/v1/checkout/verify/T-REF-5", None, None)
        .await;
    assert_status(&response, StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], true);
    assert_eq!(json["data"]["order"]["reference"], "T-REF-5");

    assert_eq!(app.count_orders().await, 1);
}

#[tokio::test]
async fn concurrent_confirmation_triggers_create_one_order() {
    let app = TestApp::new().await;
    let buyer = app.seed_user("buyer@example.com").await;
    let tenant = app.seed_tenant("acme", true).await;
    let product = app.seed_product(tenant.id, "Ebook", dec!(5000), false).await;

    let payload = charge_success_payload(
        "T-REF-6",
        buyer.id,
        tenant.id,
        &[(product.id, "Ebook", dec!(5000))],
        500_000,
    );
    let signature = storefront_api::gateway::signature::sign(&payload, common::TEST_SECRET);

    let confirmation = app.state.services.confirmation.clone();
    let (a, b) = tokio::join!(
        confirmation.handle_webhook(&payload, Some(&signature)),
        confirmation.handle_webhook(&payload, Some(&signature)),
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(app.count_orders().await, 1);
}

#[tokio::test]
async fn failed_transaction_never_becomes_an_order() {
    let app = TestApp::new().await;
    app.gateway
        .stub_verify(VerifiedTransaction {
            id: None,
            status: "abandoned".into(),
            reference: "T-REF-7".into(),
            amount: 500_000,
            metadata: None,
        })
        .await;

    let response = app
        .request(Method::GET, "/api/v1/checkout/verify/T-REF-7", None, None)
        .await;
    assert_status(&response, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(app.count_orders().await, 0);
}

#[tokio::test]
async fn unknown_metadata_user_is_a_retryable_failure() {
    let app = TestApp::new().await;
    let tenant = app.seed_tenant("acme", true).await;
    let product = app.seed_product(tenant.id, "Ebook", dec!(5000), false).await;

    // Metadata points at a user this instance has never seen.
    let payload = charge_success_payload(
        "T-REF-8",
        Uuid::new_v4(),
        tenant.id,
        &[(product.id, "Ebook", dec!(5000))],
        500_000,
    );

    let response = app.deliver_signed_webhook(&payload).await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.count_orders().await, 0);
}
