// src/models/timeline.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Tipos de evento da timeline. O formato do metadata é fechado por tipo,
// permitindo que consumidores façam pattern-match exaustivo:
//   criacao        -> {}
//   atribuicao     -> {responsavel: {id, nome}}
//   status         -> {statusAnterior, status}
//   comentario     -> {texto}
//   tempo          -> {tempo, descricao}
//   arquivo        -> {arquivo: {nome, url}}
//   fechamento     -> {statusAnterior, status, motivo}
//   transferencia  -> {de: {id, nome} | null, para: {id, nome}, texto}
//   rejeicao       -> {statusAnterior, status, motivo}
//   reabertura     -> {statusAnterior, status, motivo}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Criacao,
    Atribuicao,
    Status,
    Comentario,
    Tempo,
    Arquivo,
    Fechamento,
    Transferencia,
    Rejeicao,
    Reabertura,
}

// Um fato imutável: criado exatamente uma vez por ação de ciclo de vida,
// na mesma transação da ação que registra. Nunca é alterado ou removido;
// correções entram como novos eventos compensatórios.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub user_id: Uuid,
    pub event_type: EventType,
    pub description: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

// --- Histórico de transferências (derivado) ---

// Referência mínima a um usuário dentro do metadata de eventos
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub nome: String,
}

#[derive(Debug, Deserialize)]
struct TransferMeta {
    de: Option<UserRef>,
    para: UserRef,
    texto: String,
}

// Uma entrada do histórico de transferências. Não existe lista embutida na
// OS: o histórico é derivado filtrando os eventos `transferencia`, o que o
// torna append-only por construção.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub date: DateTime<Utc>,
    pub from_user: Option<UserRef>,
    pub to_user: UserRef,
    pub reason: String,
}

impl TransferRecord {
    /// Converte um evento `transferencia` em entrada de histórico.
    /// Eventos de outros tipos (ou com metadata fora do formato) são ignorados.
    pub fn from_event(event: &TimelineEvent) -> Option<TransferRecord> {
        if event.event_type != EventType::Transferencia {
            return None;
        }
        let meta: TransferMeta = serde_json::from_value(event.metadata.clone()).ok()?;
        Some(TransferRecord {
            date: event.created_at,
            from_user: meta.de,
            to_user: meta.para,
            reason: meta.texto,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: EventType, metadata: Value) -> TimelineEvent {
        TimelineEvent {
            id: Uuid::new_v4(),
            service_order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_type,
            description: "x".into(),
            metadata,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn transferencia_vira_entrada_de_historico() {
        let de = Uuid::new_v4();
        let para = Uuid::new_v4();
        let ev = event(
            EventType::Transferencia,
            json!({
                "de": {"id": de, "nome": "Ana"},
                "para": {"id": para, "nome": "Bruno"},
                "texto": "férias"
            }),
        );

        let record = TransferRecord::from_event(&ev).unwrap();
        assert_eq!(record.from_user.as_ref().unwrap().id, de);
        assert_eq!(record.to_user.id, para);
        assert_eq!(record.reason, "férias");
    }

    #[test]
    fn primeira_transferencia_pode_nao_ter_origem() {
        let ev = event(
            EventType::Transferencia,
            json!({
                "de": null,
                "para": {"id": Uuid::new_v4(), "nome": "Bruno"},
                "texto": "atribuição inicial"
            }),
        );
        let record = TransferRecord::from_event(&ev).unwrap();
        assert!(record.from_user.is_none());
    }

    #[test]
    fn outros_tipos_de_evento_sao_ignorados() {
        let ev = event(EventType::Comentario, json!({"texto": "olá"}));
        assert!(TransferRecord::from_event(&ev).is_none());
    }
}
