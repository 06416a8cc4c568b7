pub mod crm_repo;
pub mod orders_repo;
pub mod tenancy_repo;
pub mod timeline_repo;
pub mod user_repo;

pub use crm_repo::CustomerRepository;
pub use orders_repo::OrderRepository;
pub use tenancy_repo::OrganizationRepository;
pub use timeline_repo::TimelineRepository;
pub use user_repo::UserRepository;
