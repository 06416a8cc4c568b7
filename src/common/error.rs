// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::orders::OrderStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante carrega um `code` estável e legível por máquina (ver `code()`),
// distinto da mensagem humana, para que clientes não precisem casar texto.
#[derive(Debug, Error)]
pub enum AppError {
    // --- 400: o cliente precisa corrigir a entrada ---
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Transição de status inválida: {de} -> {para}")]
    InvalidStatusTransition { de: OrderStatus, para: OrderStatus },

    #[error("Motivo de fechamento é obrigatório")]
    ClosingReasonRequired,

    #[error("Motivo de reprovação é obrigatório")]
    RejectionReasonRequired,

    #[error("Motivo de reabertura é obrigatório")]
    ReopenReasonRequired,

    #[error("Motivo da transferência é obrigatório")]
    TransferReasonRequired,

    #[error("A OS já está atribuída a este usuário")]
    SameAssignee,

    // --- 401: re-autenticar ---
    #[error("E-mail ou senha inválidos")]
    InvalidCredentials,

    #[error("Token de autenticação inválido ou ausente")]
    InvalidToken,

    // --- 403: autenticado, porém proibido ---
    #[error("Recurso pertence a outra organização")]
    WrongOrganization,

    #[error("Permissão insuficiente para esta operação")]
    InsufficientRole,

    #[error("Somente o administrador do sistema pode alterar um proprietário")]
    ProtectedSubject,

    // --- 404 ---
    #[error("{0} não encontrado(a)")]
    ResourceNotFound(String),

    // --- 409: seguro repetir após recarregar ---
    #[error("E-mail já cadastrado")]
    EmailAlreadyExists,

    #[error("Documento '{0}' já cadastrado nesta organização")]
    DocumentAlreadyExists(String),

    // A OS foi alterada por outra requisição entre a leitura e a escrita
    #[error("A OS foi modificada por outra operação; recarregue e tente novamente")]
    ConcurrencyConflict,

    // --- 500: transiente ou bug; a transação já sofreu rollback ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),
}

impl AppError {
    /// Código estável para o cliente ramificar sem casar a prosa.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validacao",
            AppError::InvalidStatusTransition { .. } => "status_invalido",
            AppError::ClosingReasonRequired => "motivo_fechamento_obrigatorio",
            AppError::RejectionReasonRequired => "motivo_reprovacao_obrigatorio",
            AppError::ReopenReasonRequired => "motivo_reabertura_obrigatorio",
            AppError::TransferReasonRequired => "motivo_transferencia_obrigatorio",
            AppError::SameAssignee => "mesmo_responsavel",
            AppError::InvalidCredentials => "credenciais_invalidas",
            AppError::InvalidToken => "token_invalido",
            AppError::WrongOrganization => "organizacao_incorreta",
            AppError::InsufficientRole => "permissao_insuficiente",
            AppError::ProtectedSubject => "alvo_protegido",
            AppError::ResourceNotFound(_) => "nao_encontrado",
            AppError::EmailAlreadyExists => "email_duplicado",
            AppError::DocumentAlreadyExists(_) => "documento_duplicado",
            AppError::ConcurrencyConflict => "conflito_concorrencia",
            AppError::DatabaseError(_) => "erro_banco",
            AppError::InternalServerError(_) => "erro_interno",
            AppError::BcryptError(_) => "erro_interno",
            AppError::JwtError(_) => "erro_interno",
            AppError::FontNotFound(_) => "erro_interno",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidStatusTransition { .. }
            | AppError::ClosingReasonRequired
            | AppError::RejectionReasonRequired
            | AppError::ReopenReasonRequired
            | AppError::TransferReasonRequired
            | AppError::SameAssignee => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            AppError::WrongOrganization
            | AppError::InsufficientRole
            | AppError::ProtectedSubject => StatusCode::FORBIDDEN,

            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists
            | AppError::DocumentAlreadyExists(_)
            | AppError::ConcurrencyConflict => StatusCode::CONFLICT,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::FontNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validação retorna todos os detalhes por campo.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "code": self.code(),
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada; o cliente recebe o genérico.
            tracing::error!("Erro interno do servidor: {}", self);
            let body = Json(json!({
                "error": "Ocorreu um erro inesperado.",
                "code": self.code(),
            }));
            return (status, body).into_response();
        }

        let body = Json(json!({ "error": self.to_string(), "code": self.code() }));
        (status, body).into_response()
    }
}
