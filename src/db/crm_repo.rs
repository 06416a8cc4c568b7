// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        name: &str,
        document: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (organization_id, name, document, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(document)
        .bind(email)
        .bind(phone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Documento é único por organização
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DocumentAlreadyExists(
                        document.unwrap_or("?").to_string(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn list_by_org(&self, organization_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE organization_id = $1 ORDER BY name ASC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_in_org<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    /// Atualização parcial: campos ausentes mantêm o valor atual.
    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        document: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = COALESCE($3, name),
                document = COALESCE($4, document),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(document)
        .bind(email)
        .bind(phone)
        .bind(is_active)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::DocumentAlreadyExists(
                        document.unwrap_or("?").to_string(),
                    );
                }
            }
            e.into()
        })
    }
}
