// src/db/timeline_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::timeline::{EventType, TimelineEvent},
};

// Somente INSERT e SELECT: eventos nunca sofrem UPDATE ou DELETE por aqui.
#[derive(Clone)]
pub struct TimelineRepository {
    pool: PgPool,
}

impl TimelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        user_id: Uuid,
        event_type: EventType,
        description: &str,
        metadata: &Value,
    ) -> Result<TimelineEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let event = sqlx::query_as::<_, TimelineEvent>(
            r#"
            INSERT INTO timeline_events (service_order_id, user_id, event_type, description, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(service_order_id)
        .bind(user_id)
        .bind(event_type)
        .bind(description)
        .bind(metadata)
        .fetch_one(executor)
        .await?;
        Ok(event)
    }

    // Mais recente primeiro, para exibição
    pub async fn list_for_order(
        &self,
        service_order_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, AppError> {
        let events = sqlx::query_as::<_, TimelineEvent>(
            r#"
            SELECT * FROM timeline_events
            WHERE service_order_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(service_order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    // Em ordem cronológica: é a fonte do histórico de transferências
    pub async fn list_transfers(
        &self,
        service_order_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, AppError> {
        let events = sqlx::query_as::<_, TimelineEvent>(
            r#"
            SELECT * FROM timeline_events
            WHERE service_order_id = $1 AND event_type = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(service_order_id)
        .bind(EventType::Transferencia)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
