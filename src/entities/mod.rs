pub mod order;
pub mod product;
pub mod product_variant;
pub mod tenant;
pub mod user;

pub use order::Entity as Order;
pub use product::Entity as Product;
pub use product_variant::Entity as ProductVariant;
pub use tenant::Entity as Tenant;
pub use user::Entity as User;
