// src/services/team_service.rs

use bcrypt::hash;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{User, UserRole},
};
use crate::services::access;

#[derive(Clone)]
pub struct TeamService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl TeamService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn list(&self, actor: &User) -> Result<Vec<User>, AppError> {
        let org = access::require_org(actor)?;
        access::authorize_management(actor, org)?;
        self.user_repo.list_by_org(org).await
    }

    pub async fn add_member(
        &self,
        actor: &User,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
        can_view_all: bool,
    ) -> Result<User, AppError> {
        let org = access::require_org(actor)?;
        access::authorize_management(actor, org)?;

        // Criar outro proprietário ou um admin global não passa por aqui
        if matches!(role, UserRole::Admin | UserRole::Owner) && actor.role != UserRole::Admin {
            return Err(AppError::InsufficientRole);
        }

        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.user_repo
            .create_user(
                &self.pool,
                Some(org),
                name,
                email,
                &hashed_password,
                role,
                can_view_all,
            )
            .await
    }

    pub async fn update_member(
        &self,
        actor: &User,
        member_id: Uuid,
        name: Option<&str>,
        role: Option<UserRole>,
        can_view_all: Option<bool>,
        is_active: Option<bool>,
    ) -> Result<User, AppError> {
        let subject = self
            .user_repo
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Usuário".to_string()))?;

        access::authorize_member_update(actor, &subject)?;

        // Promover a proprietário/admin é exclusivo do admin global
        if matches!(role, Some(UserRole::Admin) | Some(UserRole::Owner))
            && actor.role != UserRole::Admin
        {
            return Err(AppError::InsufficientRole);
        }

        self.user_repo
            .update_member(&self.pool, subject.id, name, role, can_view_all, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Usuário".to_string()))
    }

    /// Soft-delete: o membro nunca é removido fisicamente.
    pub async fn deactivate(&self, actor: &User, member_id: Uuid) -> Result<User, AppError> {
        self.update_member(actor, member_id, None, None, None, Some(false))
            .await
    }
}
