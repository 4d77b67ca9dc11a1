use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An independent seller operating a storefront within the marketplace.
///
/// A tenant cannot receive purchases until `paystack_details_submitted` is
/// true and a subaccount code exists.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    #[sea_orm(nullable)]
    pub paystack_subaccount_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub platform_fee_percentage: Decimal,
    #[sea_orm(nullable)]
    pub bank_code: Option<String>,
    #[sea_orm(nullable)]
    pub account_number: Option<String>,
    pub paystack_details_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the tenant can receive purchases through the gateway.
    pub fn is_payment_enabled(&self) -> bool {
        self.paystack_details_submitted && self.paystack_subaccount_code.is_some()
    }
}
