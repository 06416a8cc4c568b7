// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Busca um usuário ativo dentro de uma organização.
    /// É a validação usada para novos responsáveis de OS: inativo ou de outra
    /// organização simplesmente não é encontrado.
    pub async fn find_active_in_org<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND organization_id = $2 AND is_active = TRUE",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    // Cria um novo usuário
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        organization_id: Option<Uuid>,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
        can_view_all: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (organization_id, name, email, password_hash, role, can_view_all)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(can_view_all)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Converte violação de chave única em erro amigável
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    // Lista os membros de uma organização
    pub async fn list_by_org(&self, organization_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE organization_id = $1 ORDER BY name ASC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Atualização parcial de um membro. Campos ausentes mantêm o valor atual.
    pub async fn update_member<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        role: Option<UserRole>,
        can_view_all: Option<bool>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                can_view_all = COALESCE($4, can_view_all),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(role)
        .bind(can_view_all)
        .bind(is_active)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }
}
