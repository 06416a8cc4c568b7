// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papéis fixos do sistema. 'Admin' é global e não pertence a nenhuma organização;
// os demais existem dentro de uma organização.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Owner,
    Manager,
    Technician,
    Assistant,
}

impl UserRole {
    /// Papéis com poder de gestão (equipe, clientes, qualquer OS da organização).
    pub fn is_management(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Owner | UserRole::Manager)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    // NULL apenas para o admin global
    pub organization_id: Option<Uuid>,

    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub role: UserRole,

    // Flag "vê todas as OS" mesmo sem papel de gestão
    pub can_view_all: bool,

    // Desativação é o soft-delete: o usuário nunca é removido fisicamente
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro: cria a organização e o seu proprietário em uma operação
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Assistência Técnica Silva")]
    pub organization_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João Silva")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@exemplo.com")]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,    // ID do usuário
    pub email: String,
    pub exp: usize,   // Expiration time
    pub iat: usize,   // Issued At
}
