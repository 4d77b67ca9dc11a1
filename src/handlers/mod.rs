pub mod checkout;
pub mod common;
pub mod library;
pub mod products;
pub mod tenants;
pub mod webhooks;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::gateway::PaymentGateway;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub pricing: Arc<crate::services::pricing::PricingService>,
    pub checkout: Arc<crate::services::checkout::CheckoutService>,
    pub confirmation: Arc<crate::services::confirmation::ConfirmationService>,
    pub ledger: Arc<crate::services::orders::OrderLedgerService>,
    pub library: Arc<crate::services::library::LibraryService>,
    pub onboarding: Arc<crate::services::tenants::TenantOnboardingService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<dyn PaymentGateway>,
        config: AppConfig,
    ) -> Self {
        let pricing = Arc::new(crate::services::pricing::PricingService::new(db.clone()));
        let ledger = Arc::new(crate::services::orders::OrderLedgerService::new(db.clone()));

        let checkout = Arc::new(crate::services::checkout::CheckoutService::new(
            db.clone(),
            gateway.clone(),
            pricing.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let confirmation = Arc::new(crate::services::confirmation::ConfirmationService::new(
            db.clone(),
            gateway.clone(),
            ledger.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let library = Arc::new(crate::services::library::LibraryService::new(
            db.clone(),
            ledger.clone(),
        ));
        let onboarding = Arc::new(crate::services::tenants::TenantOnboardingService::new(
            db,
            gateway,
            event_sender,
            config,
        ));

        Self {
            pricing,
            checkout,
            confirmation,
            ledger,
            library,
            onboarding,
        }
    }
}
