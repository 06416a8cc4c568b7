// src/models/orders.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{common::error::AppError, models::timeline::EventType};

// --- Enums ---

// Ciclo de vida da OS. Conjunto fechado: transições fora da tabela de
// `plan_transition` são rejeitadas antes de qualquer mutação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pendente,
    EmAndamento,
    Concluida,
    // Fechada após a data agendada: o motor decide, nunca o chamador
    Encerrada,
    Reprovada,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "pendente",
            OrderStatus::EmAndamento => "em_andamento",
            OrderStatus::Concluida => "concluida",
            OrderStatus::Encerrada => "encerrada",
            OrderStatus::Reprovada => "reprovada",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    Baixa,
    Media,
    Alta,
    Urgente,
}

// --- A Ordem de Serviço ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,

    #[schema(ignore)]
    pub organization_id: Uuid,

    pub customer_id: Option<Uuid>,

    #[schema(example = "Manutenção do ar-condicionado")]
    pub title: String,
    pub description: Option<String>,

    pub status: OrderStatus,
    pub priority: OrderPriority,

    pub assigned_to: Option<Uuid>,
    pub assigned_by: Uuid,

    pub scheduled_at: Option<DateTime<Utc>>,

    pub closing_reason: Option<String>,
    pub reopen_reason: Option<String>,

    // Carimbado uma única vez, na primeira conclusão. A reabertura NÃO limpa
    // este campo: ele registra o primeiro fechamento para auditoria.
    pub closed_at: Option<DateTime<Utc>>,

    // Concorrência otimista: toda escrita exige a versão que foi lida
    #[schema(ignore)]
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Máquina de estados ---

/// Resultado do planejamento de uma transição: o que gravar e qual evento emitir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub new_status: OrderStatus,
    pub event_type: EventType,
    // Verdadeiro apenas no fechamento; o carimbo usa COALESCE(closed_at, now())
    pub stamps_closed_at: bool,
    pub motivo: Option<String>,
}

fn non_empty(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
}

/// Decide a transição de status sem tocar no banco.
///
/// Regras:
/// - `pendente -> em_andamento` sem pré-condição extra;
/// - fechamento (a partir de `pendente` ou `em_andamento`) exige motivo, e o
///   terminal é decidido aqui: agendamento estritamente no passado vira
///   `encerrada`, caso contrário `concluida` — independente do que o chamador pediu;
/// - `concluida`/`encerrada -> reprovada` exige motivo de reprovação;
/// - reabertura (`concluida`/`encerrada -> pendente`) exige motivo de reabertura;
/// - qualquer outra combinação é rejeitada antes de qualquer mutação.
pub fn plan_transition(
    current: OrderStatus,
    requested: OrderStatus,
    scheduled_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    closing_reason: Option<&str>,
    reopen_reason: Option<&str>,
) -> Result<TransitionPlan, AppError> {
    use OrderStatus::*;

    match (current, requested) {
        (Pendente, EmAndamento) => Ok(TransitionPlan {
            new_status: EmAndamento,
            event_type: EventType::Status,
            stamps_closed_at: false,
            motivo: None,
        }),

        (Pendente | EmAndamento, Concluida | Encerrada) => {
            let motivo = non_empty(closing_reason).ok_or(AppError::ClosingReasonRequired)?;

            // Agendamento vencido => encerrada (conclusão fora do prazo)
            let terminal = match scheduled_at {
                Some(scheduled) if scheduled < now => Encerrada,
                _ => Concluida,
            };

            Ok(TransitionPlan {
                new_status: terminal,
                event_type: EventType::Fechamento,
                stamps_closed_at: true,
                motivo: Some(motivo),
            })
        }

        (Concluida | Encerrada, Reprovada) => {
            let motivo = non_empty(closing_reason).ok_or(AppError::RejectionReasonRequired)?;
            Ok(TransitionPlan {
                new_status: Reprovada,
                event_type: EventType::Rejeicao,
                stamps_closed_at: false,
                motivo: Some(motivo),
            })
        }

        (Concluida | Encerrada, Pendente) => {
            let motivo = non_empty(reopen_reason).ok_or(AppError::ReopenReasonRequired)?;
            Ok(TransitionPlan {
                new_status: Pendente,
                event_type: EventType::Reabertura,
                stamps_closed_at: false,
                motivo: Some(motivo),
            })
        }

        (de, para) => Err(AppError::InvalidStatusTransition { de, para }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2025-06-15T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn pendente_para_em_andamento_nao_exige_motivo() {
        let plan =
            plan_transition(OrderStatus::Pendente, OrderStatus::EmAndamento, None, now(), None, None)
                .unwrap();
        assert_eq!(plan.new_status, OrderStatus::EmAndamento);
        assert_eq!(plan.event_type, EventType::Status);
        assert!(!plan.stamps_closed_at);
    }

    #[test]
    fn fechamento_sem_motivo_e_rejeitado() {
        let err = plan_transition(
            OrderStatus::EmAndamento,
            OrderStatus::Concluida,
            None,
            now(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ClosingReasonRequired));

        // Motivo só de espaços também não vale
        let err = plan_transition(
            OrderStatus::EmAndamento,
            OrderStatus::Concluida,
            None,
            now(),
            Some("   "),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ClosingReasonRequired));
    }

    #[test]
    fn agendamento_vencido_fecha_como_encerrada() {
        let scheduled = now() - Duration::days(1);
        let plan = plan_transition(
            OrderStatus::Pendente,
            OrderStatus::Concluida,
            Some(scheduled),
            now(),
            Some("serviço executado"),
            None,
        )
        .unwrap();
        assert_eq!(plan.new_status, OrderStatus::Encerrada);
        assert_eq!(plan.event_type, EventType::Fechamento);
        assert!(plan.stamps_closed_at);
    }

    #[test]
    fn agendamento_futuro_fecha_como_concluida() {
        let scheduled = now() + Duration::days(1);
        let plan = plan_transition(
            OrderStatus::EmAndamento,
            OrderStatus::Concluida,
            Some(scheduled),
            now(),
            Some("ok"),
            None,
        )
        .unwrap();
        assert_eq!(plan.new_status, OrderStatus::Concluida);
    }

    #[test]
    fn sem_agendamento_fecha_como_concluida() {
        let plan = plan_transition(
            OrderStatus::EmAndamento,
            OrderStatus::Encerrada,
            None,
            now(),
            Some("ok"),
            None,
        )
        .unwrap();
        assert_eq!(plan.new_status, OrderStatus::Concluida);
    }

    #[test]
    fn reabertura_exige_motivo() {
        let err = plan_transition(
            OrderStatus::Concluida,
            OrderStatus::Pendente,
            None,
            now(),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ReopenReasonRequired));

        let plan = plan_transition(
            OrderStatus::Encerrada,
            OrderStatus::Pendente,
            None,
            now(),
            None,
            Some("cliente reclamou"),
        )
        .unwrap();
        assert_eq!(plan.new_status, OrderStatus::Pendente);
        assert_eq!(plan.event_type, EventType::Reabertura);
        assert!(!plan.stamps_closed_at);
    }

    #[test]
    fn reprovacao_so_a_partir_de_fechada() {
        let plan = plan_transition(
            OrderStatus::Concluida,
            OrderStatus::Reprovada,
            None,
            now(),
            Some("serviço incompleto"),
            None,
        )
        .unwrap();
        assert_eq!(plan.event_type, EventType::Rejeicao);

        let err = plan_transition(
            OrderStatus::Pendente,
            OrderStatus::Reprovada,
            None,
            now(),
            Some("x"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn reabertura_nao_alcancavel_de_reprovada_ou_pendente() {
        for de in [OrderStatus::Reprovada, OrderStatus::Pendente] {
            let err = plan_transition(
                de,
                OrderStatus::Pendente,
                None,
                now(),
                None,
                Some("motivo"),
            )
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidStatusTransition { .. }), "de {de}");
        }
    }

    #[test]
    fn transicoes_fora_da_tabela_sao_invalidas() {
        // Voltar de em_andamento para pendente não existe
        let err = plan_transition(
            OrderStatus::EmAndamento,
            OrderStatus::Pendente,
            None,
            now(),
            None,
            Some("x"),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));

        // Fechar o que já está fechado também não
        let err = plan_transition(
            OrderStatus::Concluida,
            OrderStatus::Concluida,
            None,
            now(),
            Some("x"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
    }
}
