// src/db/orders_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{OrderPriority, OrderStatus, ServiceOrder},
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

// Todas as escritas carregam `WHERE version = $n` e incrementam a versão:
// zero linhas afetadas numa OS existente significa conflito de concorrência,
// nunca atualização parcial.
impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_order<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        customer_id: Option<Uuid>,
        title: &str,
        description: Option<&str>,
        priority: OrderPriority,
        assigned_to: Option<Uuid>,
        assigned_by: Uuid,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<ServiceOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(
            r#"
            INSERT INTO service_orders (
                organization_id, customer_id, title, description,
                priority, assigned_to, assigned_by, scheduled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(customer_id)
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(assigned_to)
        .bind(assigned_by)
        .bind(scheduled_at)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    // A checagem de organização fica na política de acesso, que distingue
    // "outra organização" (403) de "não existe" (404).
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn list_for_org(&self, organization_id: Uuid) -> Result<Vec<ServiceOrder>, AppError> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE organization_id = $1 ORDER BY created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // Visão do técnico sem a flag "vê todas": apenas as OS sob sua responsabilidade
    pub async fn list_assigned(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE organization_id = $1 AND assigned_to = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn list_all(&self) -> Result<Vec<ServiceOrder>, AppError> {
        let orders =
            sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(orders)
    }

    /// Edição geral: tudo-ou-nada, campos ausentes mantêm o valor atual.
    pub async fn update_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected_version: i32,
        title: Option<&str>,
        description: Option<&str>,
        priority: Option<OrderPriority>,
        customer_id: Option<Uuid>,
        scheduled_at: Option<DateTime<Utc>>,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                priority = COALESCE($5, priority),
                customer_id = COALESCE($6, customer_id),
                scheduled_at = COALESCE($7, scheduled_at),
                assigned_to = COALESCE($8, assigned_to),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(customer_id)
        .bind(scheduled_at)
        .bind(assigned_to)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// Aplica uma transição de status planejada.
    /// `closed_at` é carimbado uma única vez (COALESCE) e nunca limpo.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected_version: i32,
        new_status: OrderStatus,
        closing_reason: Option<&str>,
        reopen_reason: Option<&str>,
        stamp_closed_at: bool,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders SET
                status = $3,
                closing_reason = COALESCE($4, closing_reason),
                reopen_reason = COALESCE($5, reopen_reason),
                closed_at = CASE WHEN $6 THEN COALESCE(closed_at, NOW()) ELSE closed_at END,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(new_status)
        .bind(closing_reason)
        .bind(reopen_reason)
        .bind(stamp_closed_at)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn update_assignee<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        expected_version: i32,
        assigned_to: Uuid,
    ) -> Result<Option<ServiceOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders SET
                assigned_to = $3,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(assigned_to)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    // Exclusão física; os eventos da timeline caem em cascata
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM service_orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
