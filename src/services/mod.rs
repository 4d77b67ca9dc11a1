pub mod checkout;
pub mod confirmation;
pub mod library;
pub mod orders;
pub mod pricing;
pub mod tenants;

pub use checkout::CheckoutService;
pub use confirmation::ConfirmationService;
pub use library::LibraryService;
pub use orders::OrderLedgerService;
pub use pricing::PricingService;
pub use tenants::TenantOnboardingService;
