// src/handlers/team.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{User, UserRole},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Carlos Pereira")]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[schema(example = "technician")]
    pub role: UserRole,

    #[serde(default)]
    pub can_view_all: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberPayload {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub can_view_all: Option<bool>,
    pub is_active: Option<bool>,
}

// GET /api/team
#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    responses(
        (status = 200, description = "Membros da organização", body = [User]),
        (status = 403, description = "Permissão insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let members = app_state.team_service.list(&user).await?;
    Ok(Json(members))
}

// POST /api/team
#[utoipa::path(
    post,
    path = "/api/team",
    tag = "Team",
    request_body = AddMemberPayload,
    responses(
        (status = 201, description = "Membro adicionado", body = User),
        (status = 403, description = "Permissão insuficiente"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AddMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let member = app_state
        .team_service
        .add_member(
            &user,
            &payload.name,
            &payload.email,
            &payload.password,
            payload.role,
            payload.can_view_all,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

// PATCH /api/team/{id}
#[utoipa::path(
    patch,
    path = "/api/team/{id}",
    tag = "Team",
    request_body = UpdateMemberPayload,
    responses(
        (status = 200, description = "Membro atualizado", body = User),
        (status = 403, description = "Permissão insuficiente ou alvo protegido"),
        (status = 404, description = "Usuário não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do membro")),
    security(("api_jwt" = []))
)]
pub async fn update_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state
        .team_service
        .update_member(
            &user,
            id,
            payload.name.as_deref(),
            payload.role,
            payload.can_view_all,
            payload.is_active,
        )
        .await?;

    Ok(Json(member))
}

// DELETE /api/team/{id} — desativação, nunca remoção física
#[utoipa::path(
    delete,
    path = "/api/team/{id}",
    tag = "Team",
    responses(
        (status = 200, description = "Membro desativado", body = User),
        (status = 403, description = "Permissão insuficiente ou alvo protegido"),
        (status = 404, description = "Usuário não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do membro")),
    security(("api_jwt" = []))
)]
pub async fn deactivate_member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let member = app_state.team_service.deactivate(&user, id).await?;
    Ok(Json(member))
}
