// src/handlers/crm.rs

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
    models::crm::Customer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria Souza")]
    pub name: String,

    #[schema(example = "123.456.789-00")]
    pub document: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    pub name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "Documento já cadastrado na organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = app_state
        .customer_service
        .create(
            &user,
            &payload.name,
            payload.document.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "CRM",
    responses(
        (status = 200, description = "Clientes da organização", body = [Customer])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list(&user).await?;
    Ok(Json(customers))
}

// PATCH /api/customers/{id}
#[utoipa::path(
    patch,
    path = "/api/customers/{id}",
    tag = "CRM",
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do cliente")),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .customer_service
        .update(
            &user,
            id,
            payload.name.as_deref(),
            payload.document.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
            payload.is_active,
        )
        .await?;

    Ok(Json(customer))
}

// DELETE /api/customers/{id} — desativação (soft)
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "CRM",
    responses(
        (status = 200, description = "Cliente desativado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do cliente")),
    security(("api_jwt" = []))
)]
pub async fn deactivate_customer(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.deactivate(&user, id).await?;
    Ok(Json(customer))
}
