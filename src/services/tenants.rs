//! Tenant payment onboarding.
//!
//! A tenant submits bank details once; the account is resolved against the
//! gateway, a split subaccount is created carrying the platform fee, and the
//! tenant flips to payment-enabled.

use crate::{
    config::AppConfig,
    entities::tenant,
    errors::ServiceError,
    events::{Event, EventSender},
    gateway::{CreateSubaccountRequest, PaymentGateway, ResolveAccountRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentDetails {
    #[validate(length(min = 1, message = "Bank code is required"))]
    pub bank_code: String,
    #[validate(length(min = 10, max = 10, message = "Account number must be 10 digits"))]
    pub account_number: String,
}

#[derive(Clone)]
pub struct TenantOnboardingService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
    config: AppConfig,
}

impl TenantOnboardingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
            config,
        }
    }

    /// Registers a new tenant with a unique slug. The tenant starts
    /// payment-disabled until bank details are submitted.
    #[instrument(skip(self))]
    pub async fn register_tenant(
        &self,
        slug: &str,
        name: &str,
    ) -> Result<tenant::Model, ServiceError> {
        if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(ServiceError::ValidationError(
                "Slug must be lowercase alphanumeric with hyphens".to_string(),
            ));
        }

        let existing = tenant::Entity::find()
            .filter(tenant::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Tenant slug {} is already taken",
                slug
            )));
        }

        let now = chrono::Utc::now();
        let model = tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(slug.to_string()),
            name: Set(name.to_string()),
            paystack_subaccount_code: Set(None),
            platform_fee_percentage: Set(self.config.platform_fee_percentage),
            bank_code: Set(None),
            account_number: Set(None),
            paystack_details_submitted: Set(false),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let tenant = model.insert(&*self.db).await?;
        info!(tenant_id = %tenant.id, slug, "Tenant registered");
        Ok(tenant)
    }

    /// Submits bank details for a tenant and provisions the gateway split
    /// subaccount. Resolving the account first rejects typoed details before
    /// anything is persisted.
    #[instrument(skip(self, details))]
    pub async fn submit_payment_details(
        &self,
        slug: &str,
        details: PaymentDetails,
    ) -> Result<tenant::Model, ServiceError> {
        details.validate()?;

        let tenant = self
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tenant with slug {} not found", slug)))?;

        if tenant.is_payment_enabled() {
            return Err(ServiceError::Conflict(
                "Payment details already submitted".to_string(),
            ));
        }

        let resolved = self
            .gateway
            .resolve_account(ResolveAccountRequest {
                account_number: details.account_number.clone(),
                bank_code: details.bank_code.clone(),
            })
            .await
            .map_err(|_| {
                ServiceError::BadRequest(
                    "Could not resolve bank account, check the details".to_string(),
                )
            })?;

        let subaccount = self
            .gateway
            .create_subaccount(CreateSubaccountRequest {
                business_name: tenant.name.clone(),
                bank_code: details.bank_code.clone(),
                account_number: resolved.account_number.clone(),
                percentage_charge: tenant.platform_fee_percentage,
            })
            .await?;

        let mut active: tenant::ActiveModel = tenant.into();
        active.paystack_subaccount_code = Set(Some(subaccount.subaccount_code));
        active.bank_code = Set(Some(details.bank_code));
        active.account_number = Set(Some(resolved.account_number));
        active.paystack_details_submitted = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now()));
        let updated = active.update(&*self.db).await?;

        info!(tenant_id = %updated.id, "Tenant payment onboarding complete");
        let _ = self
            .event_sender
            .send(Event::TenantPaymentEnabled {
                tenant_id: updated.id,
            })
            .await;

        Ok(updated)
    }

    /// Looks up a tenant by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<tenant::Model>, ServiceError> {
        Ok(tenant::Entity::find()
            .filter(tenant::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_details_validation() {
        let ok = PaymentDetails {
            bank_code: "058".into(),
            account_number: "0123456789".into(),
        };
        assert!(ok.validate().is_ok());

        let short = PaymentDetails {
            bank_code: "058".into(),
            account_number: "12345".into(),
        };
        assert!(short.validate().is_err());

        let no_bank = PaymentDetails {
            bank_code: "".into(),
            account_number: "0123456789".into(),
        };
        assert!(no_bank.validate().is_err());
    }
}
