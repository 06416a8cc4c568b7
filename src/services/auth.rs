// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{OrganizationRepository, UserRepository},
    models::auth::{Claims, User, UserRole},
};

/// Emite um token com validade de 7 dias.
pub fn issue_token(user: &User, jwt_secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(7);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )?)
}

/// Valida assinatura e expiração localmente, antes de qualquer I/O.
pub fn decode_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::default();
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            org_repo,
            jwt_secret,
            pool,
        }
    }

    /// Registro: cria a organização e o seu proprietário atomicamente.
    /// Se qualquer passo falhar, nada fica para trás.
    pub async fn register_owner(
        &self,
        organization_name: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AppError> {
        // Hashing fora da transação: não toca no banco e é pesado
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;

        let org = self
            .org_repo
            .create_organization(&mut *tx, organization_name)
            .await?;

        let owner = self
            .user_repo
            .create_user(
                &mut *tx,
                Some(org.id),
                name,
                email,
                &hashed_password,
                UserRole::Owner,
                true,
            )
            .await?;

        self.org_repo.set_owner(&mut *tx, org.id, owner.id).await?;

        tx.commit().await?;

        tracing::info!("🏢 Organização '{}' registrada com proprietário {}", org.name, owner.email);

        issue_token(&owner, &self.jwt_secret)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        issue_token(&user, &self.jwt_secret)
    }

    /// Resolve o token em um usuário ativo.
    /// Token órfão (assinatura válida, usuário removido ou inativo) também é 401.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "segredo-de-teste";

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            organization_id: Some(Uuid::new_v4()),
            name: "Ana".into(),
            email: "ana@exemplo.com".into(),
            password_hash: "x".into(),
            role: UserRole::Owner,
            can_view_all: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_carrega_id_e_email() {
        let u = user();
        let token = issue_token(&u, SECRET).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.email, u.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn segredo_errado_e_rejeitado() {
        let token = issue_token(&user(), SECRET).unwrap();
        let err = decode_token(&token, "outro-segredo").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn token_expirado_e_rejeitado() {
        let u = user();
        let past = Utc::now() - chrono::Duration::days(1);
        let claims = Claims {
            sub: u.id,
            email: u.email.clone(),
            exp: past.timestamp() as usize,
            iat: (past - chrono::Duration::days(7)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();

        let err = decode_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn lixo_nao_passa() {
        let err = decode_token("nao-e-um-jwt", SECRET).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
