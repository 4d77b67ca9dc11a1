use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseBackend as DbBackend, Set, Statement};
use serde_json::Value;
use storefront_api::{
    config::AppConfig,
    db,
    entities::{product, product_variant, tenant, user},
    errors::ServiceError,
    events::{self, EventSender},
    gateway::{
        signature, CreateSubaccountRequest, CreatedSubaccount, InitializeTransactionRequest,
        InitializedTransaction, PaymentGateway, ResolveAccountRequest, ResolvedAccount,
        VerifiedTransaction,
    },
    handlers::AppServices,
    AppState,
};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "sk_test_webhook_signing_secret_0001";

/// Scripted stand-in for the Paystack client. Initiation requests are
/// captured for assertions; verify responses are stubbed per reference.
pub struct MockGateway {
    pub init_requests: Mutex<Vec<InitializeTransactionRequest>>,
    pub fail_initialize: AtomicBool,
    verify_results: Mutex<HashMap<String, VerifiedTransaction>>,
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            init_requests: Mutex::new(Vec::new()),
            fail_initialize: AtomicBool::new(false),
            verify_results: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Script the outcome of `verify_transaction` for a reference.
    pub async fn stub_verify(&self, verified: VerifiedTransaction) {
        self.verify_results
            .lock()
            .await
            .insert(verified.reference.clone(), verified);
    }

    pub async fn last_init_request(&self) -> Option<InitializeTransactionRequest> {
        self.init_requests.lock().await.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, ServiceError> {
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(ServiceError::ExternalApiError(
                "gateway unreachable: connection refused".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let reference = format!("T-TEST-{}", n);
        self.init_requests.lock().await.push(request);

        Ok(InitializedTransaction {
            authorization_url: format!("https://checkout.paystack.test/{}", reference),
            access_code: format!("AC_{}", n),
            reference,
        })
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, ServiceError> {
        self.verify_results
            .lock()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| {
                ServiceError::ExternalApiError(format!(
                    "gateway unreachable: no stub for {}",
                    reference
                ))
            })
    }

    async fn resolve_account(
        &self,
        request: ResolveAccountRequest,
    ) -> Result<ResolvedAccount, ServiceError> {
        Ok(ResolvedAccount {
            account_number: request.account_number,
            account_name: "TEST SELLER".to_string(),
        })
    }

    async fn create_subaccount(
        &self,
        request: CreateSubaccountRequest,
    ) -> Result<CreatedSubaccount, ServiceError> {
        Ok(CreatedSubaccount {
            subaccount_code: format!("ACCT_{}", Uuid::new_v4().simple()),
            account_number: request.account_number,
        })
    }
}

/// Helper harness for spinning up an application state backed by a
/// throwaway SQLite database and a scripted gateway.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub gateway: Arc<MockGateway>,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = format!("storefront_test_{}.db", Uuid::new_v4().simple());
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{db_file}?mode=rwc"),
            TEST_SECRET.to_string(),
            "storefront.test".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        // Clean schema per harness construction.
        let reset_statements = [
            "DROP TABLE IF EXISTS orders;",
            "DROP TABLE IF EXISTS product_variants;",
            "DROP TABLE IF EXISTS products;",
            "DROP TABLE IF EXISTS users;",
            "DROP TABLE IF EXISTS tenants;",
        ];
        for sql in reset_statements {
            let _ = pool
                .execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await;
        }

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(MockGateway::new());
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender),
            gateway.clone(),
            cfg.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", storefront_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            gateway,
            db_file,
            _event_task: event_task,
        }
    }

    /// Send a request against the router, optionally acting as a user.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        user_id: Option<Uuid>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id.to_string());
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Deliver a webhook payload with the given signature header. A `None`
    /// signature omits the header entirely.
    pub async fn deliver_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/webhook")
            .header("content-type", "application/json");

        if let Some(sig) = signature {
            builder = builder.header("x-paystack-signature", sig);
        }

        let request = builder
            .body(Body::from(payload.to_vec()))
            .expect("failed to build webhook request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during webhook delivery")
    }

    /// Deliver a webhook payload signed with the test secret.
    pub async fn deliver_signed_webhook(&self, payload: &[u8]) -> axum::response::Response {
        let sig = signature::sign(payload, TEST_SECRET);
        self.deliver_webhook(payload, Some(&sig)).await
    }

    pub async fn seed_user(&self, email: &str) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            username: Set(email.split('@').next().unwrap_or("buyer").to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed user")
    }

    pub async fn seed_tenant(&self, slug: &str, payment_enabled: bool) -> tenant::Model {
        let now = Utc::now();
        tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug.to_string()),
            name: Set(format!("{} store", slug)),
            paystack_subaccount_code: Set(payment_enabled.then(|| "ACCT_seeded".to_string())),
            platform_fee_percentage: Set(Decimal::new(10, 0)),
            bank_code: Set(payment_enabled.then(|| "058".to_string())),
            account_number: Set(payment_enabled.then(|| "0123456789".to_string())),
            paystack_details_submitted: Set(payment_enabled),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed tenant")
    }

    pub async fn seed_product(
        &self,
        tenant_id: Uuid,
        name: &str,
        price: Decimal,
        has_variants: bool,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            is_archived: Set(false),
            has_variants: Set(has_variants),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product")
    }

    pub async fn archive_product(&self, product: &product::Model) {
        let mut active: product::ActiveModel = product.clone().into();
        active.is_archived = Set(true);
        active
            .update(&*self.state.db)
            .await
            .expect("failed to archive product");
    }

    pub async fn seed_variant(
        &self,
        product_id: Uuid,
        size: &str,
        price: Option<Decimal>,
    ) -> product_variant::Model {
        let now = Utc::now();
        product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            color: Set(None),
            size: Set(Some(size.to_string())),
            variant_price: Set(price),
            stock: Set(100),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed variant")
    }

    pub async fn count_orders(&self) -> u64 {
        use sea_orm::{EntityTrait, PaginatorTrait};
        storefront_api::entities::order::Entity::find()
            .count(&*self.state.db)
            .await
            .expect("failed to count orders")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not valid json")
}

/// Build a `charge.success` webhook payload for the given buyer, tenant and
/// products, amount in minor units.
pub fn charge_success_payload(
    reference: &str,
    user_id: Uuid,
    tenant_id: Uuid,
    products: &[(Uuid, &str, Decimal)],
    amount_minor: i64,
) -> Vec<u8> {
    let products: Vec<Value> = products
        .iter()
        .map(|(id, name, price)| {
            serde_json::json!({
                "id": id,
                "name": name,
                "price": price,
            })
        })
        .collect();

    serde_json::to_vec(&serde_json::json!({
        "event": "charge.success",
        "data": {
            "id": 9_001,
            "reference": reference,
            "amount": amount_minor,
            "status": "success",
            "metadata": {
                "userId": user_id,
                "tenantId": tenant_id,
                "products": products,
            }
        }
    }))
    .expect("failed to serialize webhook payload")
}

pub fn assert_status(response: &axum::response::Response, expected: StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "unexpected status, expected {expected}"
    );
}
