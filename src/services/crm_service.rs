// src/services/crm_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::{auth::User, crm::Customer},
    services::access,
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    pool: PgPool,
}

// Gestão de clientes é operação de gestão: owner, manager ou admin.
impl CustomerService {
    pub fn new(repo: CustomerRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn create(
        &self,
        actor: &User,
        name: &str,
        document: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, AppError> {
        let org = access::require_org(actor)?;
        access::authorize_management(actor, org)?;

        self.repo
            .create_customer(&self.pool, org, name, document, email, phone)
            .await
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<Customer>, AppError> {
        let org = access::require_org(actor)?;
        access::authorize_management(actor, org)?;
        self.repo.list_by_org(org).await
    }

    pub async fn update(
        &self,
        actor: &User,
        customer_id: Uuid,
        name: Option<&str>,
        document: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Customer, AppError> {
        let org = access::require_org(actor)?;
        access::authorize_management(actor, org)?;

        self.repo
            .update_customer(&self.pool, org, customer_id, name, document, email, phone, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))
    }

    /// Soft-delete: clientes com OS antigas continuam referenciáveis.
    pub async fn deactivate(&self, actor: &User, customer_id: Uuid) -> Result<Customer, AppError> {
        self.update(actor, customer_id, None, None, None, None, Some(false))
            .await
    }
}
