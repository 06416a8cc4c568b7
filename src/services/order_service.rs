// src/services/order_service.rs

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, OrderRepository, UserRepository},
    models::{
        auth::User,
        orders::{plan_transition, OrderPriority, OrderStatus, ServiceOrder, TransitionPlan},
        timeline::{EventType, TimelineEvent, TransferRecord},
    },
    services::{
        access::{self, OrderAction},
        timeline_service::TimelineService,
    },
};

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
    user_repo: UserRepository,
    customer_repo: CustomerRepository,
    timeline: TimelineService,
    pool: PgPool,
}

// Toda mutação segue o mesmo desenho: política antes de qualquer escrita,
// leitura + decisão + escrita + evento dentro de UMA transação, escrita
// guardada pela versão lida. Ou a OS e o evento ficam visíveis juntos, ou nada.
impl OrderService {
    pub fn new(
        repo: OrderRepository,
        user_repo: UserRepository,
        customer_repo: CustomerRepository,
        timeline: TimelineService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            user_repo,
            customer_repo,
            timeline,
            pool,
        }
    }

    // =========================================================================
    //  CRIAÇÃO E CONSULTA
    // =========================================================================

    pub async fn create(
        &self,
        actor: &User,
        organization_id: Option<Uuid>,
        customer_id: Option<Uuid>,
        title: &str,
        description: Option<&str>,
        priority: Option<OrderPriority>,
        assigned_to: Option<Uuid>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<ServiceOrder, AppError> {
        // O admin global pode indicar a organização; os demais usam a própria
        let org = match organization_id {
            Some(org) => org,
            None => access::require_org(actor)?,
        };
        access::authorize_management(actor, org)?;

        let mut tx = self.pool.begin().await?;

        if let Some(cid) = customer_id {
            self.customer_repo
                .find_in_org(&mut *tx, org, cid)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;
        }

        // Pré-atribuição opcional: o responsável precisa ser ativo e da mesma organização
        let assignee = match assigned_to {
            Some(uid) => Some(
                self.user_repo
                    .find_active_in_org(&mut *tx, org, uid)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Responsável".to_string()))?,
            ),
            None => None,
        };

        let order = self
            .repo
            .create_order(
                &mut *tx,
                org,
                customer_id,
                title,
                description,
                priority.unwrap_or(OrderPriority::Media),
                assigned_to,
                actor.id,
                scheduled_at,
            )
            .await?;

        self.timeline
            .append(&mut *tx, order.id, actor.id, EventType::Criacao, "OS criada", &json!({}))
            .await?;

        if let Some(assignee) = assignee {
            self.timeline
                .append(
                    &mut *tx,
                    order.id,
                    actor.id,
                    EventType::Atribuicao,
                    &format!("Responsável definido: {}", assignee.name),
                    &json!({ "responsavel": { "id": assignee.id, "nome": assignee.name } }),
                )
                .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<ServiceOrder>, AppError> {
        if actor.role == crate::models::auth::UserRole::Admin {
            return self.repo.list_all().await;
        }

        let org = access::require_org(actor)?;
        if actor.role.is_management() || actor.can_view_all {
            self.repo.list_for_org(org).await
        } else {
            self.repo.list_assigned(org, actor.id).await
        }
    }

    pub async fn get(&self, actor: &User, order_id: Uuid) -> Result<ServiceOrder, AppError> {
        let order = self
            .repo
            .find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;

        access::authorize_order(actor, &order, OrderAction::Read)?;
        Ok(order)
    }

    // =========================================================================
    //  EDIÇÃO GERAL
    // =========================================================================

    pub async fn update(
        &self,
        actor: &User,
        order_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        priority: Option<OrderPriority>,
        customer_id: Option<Uuid>,
        scheduled_at: Option<DateTime<Utc>>,
        assigned_to: Option<Uuid>,
    ) -> Result<ServiceOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .repo
            .find_by_id(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;

        access::authorize_order(actor, &order, OrderAction::Edit)?;

        // Mudança de responsável pela edição geral: só papéis de gestão,
        // e o novo responsável precisa ser válido — senão NENHUM campo muda.
        let reassignment = match assigned_to {
            Some(uid) if order.assigned_to != Some(uid) => {
                if !actor.role.is_management() {
                    return Err(AppError::InsufficientRole);
                }
                Some(
                    self.user_repo
                        .find_active_in_org(&mut *tx, order.organization_id, uid)
                        .await?
                        .ok_or_else(|| AppError::ResourceNotFound("Responsável".to_string()))?,
                )
            }
            _ => None,
        };

        if let Some(cid) = customer_id {
            self.customer_repo
                .find_in_org(&mut *tx, order.organization_id, cid)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Cliente".to_string()))?;
        }

        let updated = self
            .repo
            .update_fields(
                &mut *tx,
                order.id,
                order.version,
                title,
                description,
                priority,
                customer_id,
                scheduled_at,
                assigned_to,
            )
            .await?
            .ok_or(AppError::ConcurrencyConflict)?;

        if let Some(assignee) = reassignment {
            self.timeline
                .append(
                    &mut *tx,
                    order.id,
                    actor.id,
                    EventType::Atribuicao,
                    &format!("Responsável definido: {}", assignee.name),
                    &json!({ "responsavel": { "id": assignee.id, "nome": assignee.name } }),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  TRANSIÇÃO DE STATUS
    // =========================================================================

    pub async fn change_status(
        &self,
        actor: &User,
        order_id: Uuid,
        requested: OrderStatus,
        closing_reason: Option<&str>,
        reopen_reason: Option<&str>,
    ) -> Result<ServiceOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .repo
            .find_by_id(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;

        access::authorize_order(actor, &order, OrderAction::ChangeStatus)?;

        // O motor decide a transição (inclusive concluída vs. encerrada);
        // pedido inválido falha aqui, antes de qualquer mutação.
        let plan = plan_transition(
            order.status,
            requested,
            order.scheduled_at,
            Utc::now(),
            closing_reason,
            reopen_reason,
        )?;

        // O motivo vai para o campo correspondente ao tipo de transição
        let (closing, reopen) = match plan.event_type {
            EventType::Reabertura => (None, plan.motivo.as_deref()),
            _ => (plan.motivo.as_deref(), None),
        };

        let updated = self
            .repo
            .update_status(
                &mut *tx,
                order.id,
                order.version,
                plan.new_status,
                closing,
                reopen,
                plan.stamps_closed_at,
            )
            .await?
            .ok_or(AppError::ConcurrencyConflict)?;

        self.timeline
            .append(
                &mut *tx,
                order.id,
                actor.id,
                plan.event_type,
                &transition_description(&plan, order.status),
                &transition_metadata(&plan, order.status),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  TRANSFERÊNCIA
    // =========================================================================

    /// Pré-condições na ordem do contrato; a primeira falha vence.
    pub async fn transfer(
        &self,
        actor: &User,
        order_id: Uuid,
        to_user_id: Uuid,
        reason: &str,
    ) -> Result<ServiceOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .repo
            .find_by_id(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;

        // 1. Autorização de escrita
        access::authorize_order(actor, &order, OrderAction::Transfer)?;

        // 2. Novo responsável: ativo e da mesma organização
        let target = self
            .user_repo
            .find_active_in_org(&mut *tx, order.organization_id, to_user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Responsável".to_string()))?;

        // 3. Transferir para quem já é responsável é rejeitado, não ignorado
        if order.assigned_to == Some(to_user_id) {
            return Err(AppError::SameAssignee);
        }

        // 4. Motivo obrigatório
        if reason.trim().is_empty() {
            return Err(AppError::TransferReasonRequired);
        }

        let previous = match order.assigned_to {
            Some(uid) => self.user_repo.find_by_id(uid).await?,
            None => None,
        };

        let updated = self
            .repo
            .update_assignee(&mut *tx, order.id, order.version, to_user_id)
            .await?
            .ok_or(AppError::ConcurrencyConflict)?;

        let de = previous
            .as_ref()
            .map(|u| json!({ "id": u.id, "nome": u.name }))
            .unwrap_or(Value::Null);

        let description = match &previous {
            Some(prev) => format!("OS transferida de {} para {}", prev.name, target.name),
            None => format!("OS transferida para {}", target.name),
        };

        self.timeline
            .append(
                &mut *tx,
                order.id,
                actor.id,
                EventType::Transferencia,
                &description,
                &json!({
                    "de": de,
                    "para": { "id": target.id, "nome": target.name },
                    "texto": reason.trim(),
                }),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    // =========================================================================
    //  EXCLUSÃO
    // =========================================================================

    pub async fn delete(&self, actor: &User, order_id: Uuid) -> Result<(), AppError> {
        let order = self
            .repo
            .find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;

        access::authorize_order(actor, &order, OrderAction::Delete)?;

        self.repo.delete(&self.pool, order.id).await?;
        Ok(())
    }

    // =========================================================================
    //  ANOTAÇÕES (comentário, tempo, anexo)
    // =========================================================================

    pub async fn add_comment(
        &self,
        actor: &User,
        order_id: Uuid,
        texto: &str,
    ) -> Result<TimelineEvent, AppError> {
        let order = self.writable(actor, order_id).await?;
        self.timeline
            .append(
                &self.pool,
                order.id,
                actor.id,
                EventType::Comentario,
                "Comentário adicionado",
                &json!({ "texto": texto }),
            )
            .await
    }

    /// Apontamento de tempo em minutos.
    pub async fn add_time_entry(
        &self,
        actor: &User,
        order_id: Uuid,
        tempo: i32,
        descricao: Option<&str>,
    ) -> Result<TimelineEvent, AppError> {
        let order = self.writable(actor, order_id).await?;
        self.timeline
            .append(
                &self.pool,
                order.id,
                actor.id,
                EventType::Tempo,
                &format!("Apontamento de {} min", tempo),
                &json!({ "tempo": tempo, "descricao": descricao }),
            )
            .await
    }

    /// Registra um anexo (nome + URL; o arquivo em si mora fora daqui).
    pub async fn add_attachment(
        &self,
        actor: &User,
        order_id: Uuid,
        nome: &str,
        url: &str,
    ) -> Result<TimelineEvent, AppError> {
        let order = self.writable(actor, order_id).await?;
        self.timeline
            .append(
                &self.pool,
                order.id,
                actor.id,
                EventType::Arquivo,
                &format!("Arquivo anexado: {}", nome),
                &json!({ "arquivo": { "nome": nome, "url": url } }),
            )
            .await
    }

    // =========================================================================
    //  TIMELINE
    // =========================================================================

    pub async fn events(&self, actor: &User, order_id: Uuid) -> Result<Vec<TimelineEvent>, AppError> {
        let order = self.get(actor, order_id).await?;
        self.timeline.list(order.id).await
    }

    pub async fn transfer_history(
        &self,
        actor: &User,
        order_id: Uuid,
    ) -> Result<Vec<TransferRecord>, AppError> {
        let order = self.get(actor, order_id).await?;
        self.timeline.transfer_history(order.id).await
    }

    // Busca + autorização de escrita, para as anotações
    async fn writable(&self, actor: &User, order_id: Uuid) -> Result<ServiceOrder, AppError> {
        let order = self
            .repo
            .find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Ordem de serviço".to_string()))?;
        access::authorize_order(actor, &order, OrderAction::Edit)?;
        Ok(order)
    }
}

fn transition_description(plan: &TransitionPlan, previous: OrderStatus) -> String {
    let motivo = plan.motivo.as_deref().unwrap_or("");
    match plan.event_type {
        EventType::Fechamento => match plan.new_status {
            OrderStatus::Encerrada => format!("OS encerrada fora do prazo: {}", motivo),
            _ => format!("OS concluída: {}", motivo),
        },
        EventType::Rejeicao => format!("OS reprovada: {}", motivo),
        EventType::Reabertura => format!("OS reaberta: {}", motivo),
        _ => format!("Status alterado de {} para {}", previous, plan.new_status),
    }
}

// Todo evento de transição carrega o par statusAnterior/status; o motivo
// entra apenas quando a transição exigiu um.
fn transition_metadata(plan: &TransitionPlan, previous: OrderStatus) -> Value {
    let mut meta = json!({
        "statusAnterior": previous,
        "status": plan.new_status,
    });
    if let Some(motivo) = &plan.motivo {
        meta["motivo"] = json!(motivo);
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_de_transicao_carrega_os_dois_status() {
        let plan = TransitionPlan {
            new_status: OrderStatus::EmAndamento,
            event_type: EventType::Status,
            stamps_closed_at: false,
            motivo: None,
        };
        let meta = transition_metadata(&plan, OrderStatus::Pendente);
        assert_eq!(meta["statusAnterior"], "pendente");
        assert_eq!(meta["status"], "em_andamento");
        assert!(meta.get("motivo").is_none());
    }

    #[test]
    fn metadata_de_fechamento_inclui_motivo() {
        let plan = TransitionPlan {
            new_status: OrderStatus::Encerrada,
            event_type: EventType::Fechamento,
            stamps_closed_at: true,
            motivo: Some("finalizado em campo".into()),
        };
        let meta = transition_metadata(&plan, OrderStatus::EmAndamento);
        assert_eq!(meta["statusAnterior"], "em_andamento");
        assert_eq!(meta["status"], "encerrada");
        assert_eq!(meta["motivo"], "finalizado em campo");
    }

    #[test]
    fn descricao_distingue_conclusao_no_prazo_e_fora() {
        let fora = TransitionPlan {
            new_status: OrderStatus::Encerrada,
            event_type: EventType::Fechamento,
            stamps_closed_at: true,
            motivo: Some("ok".into()),
        };
        assert!(transition_description(&fora, OrderStatus::Pendente).contains("fora do prazo"));

        let no_prazo = TransitionPlan {
            new_status: OrderStatus::Concluida,
            event_type: EventType::Fechamento,
            stamps_closed_at: true,
            motivo: Some("ok".into()),
        };
        assert!(transition_description(&no_prazo, OrderStatus::Pendente).contains("concluída"));
    }
}
