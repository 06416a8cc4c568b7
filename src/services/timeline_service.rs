// src/services/timeline_service.rs

use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TimelineRepository,
    models::timeline::{EventType, TimelineEvent, TransferRecord},
};

// Fachada do log de eventos: só acrescenta e lê. Correções são modeladas como
// novos eventos compensatórios, nunca como edição.
#[derive(Clone)]
pub struct TimelineService {
    repo: TimelineRepository,
}

impl TimelineService {
    pub fn new(repo: TimelineRepository) -> Self {
        Self { repo }
    }

    /// Insere um evento. Chamado sempre na mesma transação da ação que registra.
    pub async fn append<'e, E>(
        &self,
        executor: E,
        service_order_id: Uuid,
        acting_user_id: Uuid,
        event_type: EventType,
        description: &str,
        metadata: &Value,
    ) -> Result<TimelineEvent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .append(
                executor,
                service_order_id,
                acting_user_id,
                event_type,
                description,
                metadata,
            )
            .await
    }

    /// Eventos de uma OS, mais recente primeiro. Sem eventos => lista vazia, não erro.
    pub async fn list(&self, service_order_id: Uuid) -> Result<Vec<TimelineEvent>, AppError> {
        self.repo.list_for_order(service_order_id).await
    }

    /// Histórico de transferências derivado dos eventos `transferencia`,
    /// em ordem cronológica. Append-only por construção.
    pub async fn transfer_history(
        &self,
        service_order_id: Uuid,
    ) -> Result<Vec<TransferRecord>, AppError> {
        let events = self.repo.list_transfers(service_order_id).await?;
        Ok(events.iter().filter_map(TransferRecord::from_event).collect())
    }
}
