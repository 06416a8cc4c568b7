pub mod auth;
pub mod crm;
pub mod orders;
pub mod tenancy;
pub mod timeline;
