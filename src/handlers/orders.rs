// src/handlers/orders.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        orders::{OrderPriority, OrderStatus, ServiceOrder},
        timeline::{TimelineEvent, TransferRecord},
    },
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Manutenção do ar-condicionado")]
    pub title: String,

    pub description: Option<String>,

    pub customer_id: Option<Uuid>,

    #[schema(example = "alta")]
    pub priority: Option<OrderPriority>,

    // Pré-atribuição opcional
    pub assigned_to: Option<Uuid>,

    pub scheduled_at: Option<DateTime<Utc>>,

    // Apenas o admin global usa; os demais criam na própria organização
    #[schema(ignore)]
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<OrderPriority>,
    pub customer_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusPayload {
    #[schema(example = "concluida")]
    pub status: OrderStatus,

    #[schema(example = "Serviço executado e validado com o cliente")]
    pub closing_reason: Option<String>,

    pub reopen_reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload {
    pub assigned_to_id: Uuid,

    #[schema(example = "Férias do responsável atual")]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentPayload {
    #[validate(length(min = 1, message = "required"))]
    pub texto: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TimeEntryPayload {
    // Minutos trabalhados
    #[validate(range(min = 1, message = "invalid_number"))]
    #[schema(example = 90)]
    pub tempo: i32,

    pub descricao: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AttachmentPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "laudo.pdf")]
    pub nome: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "https://storage.exemplo.com/laudo.pdf")]
    pub url: String,
}

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/service-orders
#[utoipa::path(
    post,
    path = "/api/service-orders",
    tag = "Service Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "OS criada (status inicial: pendente)", body = ServiceOrder),
        (status = 403, description = "Permissão insuficiente"),
        (status = 404, description = "Cliente ou responsável não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let order = app_state
        .order_service
        .create(
            &user,
            payload.organization_id,
            payload.customer_id,
            &payload.title,
            payload.description.as_deref(),
            payload.priority,
            payload.assigned_to,
            payload.scheduled_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/service-orders
#[utoipa::path(
    get,
    path = "/api/service-orders",
    tag = "Service Orders",
    responses(
        (status = 200, description = "OS visíveis para o usuário", body = [ServiceOrder])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.order_service.list(&user).await?;
    Ok(Json(orders))
}

// GET /api/service-orders/{id}
#[utoipa::path(
    get,
    path = "/api/service-orders/{id}",
    tag = "Service Orders",
    responses(
        (status = 200, description = "Detalhe da OS", body = ServiceOrder),
        (status = 403, description = "Sem acesso a esta OS"),
        (status = 404, description = "OS não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.get(&user, id).await?;
    Ok(Json(order))
}

// PATCH /api/service-orders/{id}
#[utoipa::path(
    patch,
    path = "/api/service-orders/{id}",
    tag = "Service Orders",
    request_body = UpdateOrderPayload,
    responses(
        (status = 200, description = "OS atualizada (tudo-ou-nada)", body = ServiceOrder),
        (status = 403, description = "Permissão insuficiente"),
        (status = 404, description = "OS, cliente ou responsável não encontrado"),
        (status = 409, description = "Conflito de concorrência")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .update(
            &user,
            id,
            payload.title.as_deref(),
            payload.description.as_deref(),
            payload.priority,
            payload.customer_id,
            payload.scheduled_at,
            payload.assigned_to,
        )
        .await?;

    Ok(Json(order))
}

// DELETE /api/service-orders/{id}
#[utoipa::path(
    delete,
    path = "/api/service-orders/{id}",
    tag = "Service Orders",
    responses(
        (status = 204, description = "OS excluída"),
        (status = 403, description = "Somente owner/manager/admin excluem"),
        (status = 404, description = "OS não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.order_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  CICLO DE VIDA
// =============================================================================

// PATCH /api/service-orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/service-orders/{id}/status",
    tag = "Service Orders",
    request_body = ChangeStatusPayload,
    responses(
        (status = 200, description = "Transição aplicada; o motor decide concluída vs. encerrada", body = ServiceOrder),
        (status = 400, description = "Transição inválida ou motivo ausente"),
        (status = 403, description = "Permissão insuficiente"),
        (status = 404, description = "OS não encontrada"),
        (status = 409, description = "Conflito de concorrência")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .change_status(
            &user,
            id,
            payload.status,
            payload.closing_reason.as_deref(),
            payload.reopen_reason.as_deref(),
        )
        .await?;

    Ok(Json(order))
}

// POST /api/service-orders/{id}/transfer
#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/transfer",
    tag = "Service Orders",
    request_body = TransferPayload,
    responses(
        (status = 200, description = "OS transferida", body = ServiceOrder),
        (status = 400, description = "Motivo ausente ou mesmo responsável"),
        (status = 403, description = "Permissão insuficiente"),
        (status = 404, description = "OS ou responsável não encontrado"),
        (status = 409, description = "Conflito de concorrência")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn transfer_order(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .transfer(&user, id, payload.assigned_to_id, &payload.reason)
        .await?;

    Ok(Json(order))
}

// =============================================================================
//  TIMELINE E ANOTAÇÕES
// =============================================================================

// GET /api/service-orders/{id}/events
#[utoipa::path(
    get,
    path = "/api/service-orders/{id}/events",
    tag = "Timeline",
    responses(
        (status = 200, description = "Eventos da OS, mais recente primeiro", body = [TimelineEvent]),
        (status = 401, description = "Não autenticado"),
        (status = 404, description = "OS não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn list_events(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let events = app_state.order_service.events(&user, id).await?;
    Ok(Json(events))
}

// GET /api/service-orders/{id}/transfers — histórico derivado dos eventos
#[utoipa::path(
    get,
    path = "/api/service-orders/{id}/transfers",
    tag = "Timeline",
    responses(
        (status = 200, description = "Histórico de transferências, em ordem cronológica", body = [TransferRecord]),
        (status = 404, description = "OS não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state.order_service.transfer_history(&user, id).await?;
    Ok(Json(transfers))
}

// POST /api/service-orders/{id}/comments
#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/comments",
    tag = "Timeline",
    request_body = CommentPayload,
    responses(
        (status = 201, description = "Comentário registrado na timeline", body = TimelineEvent)
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let event = app_state
        .order_service
        .add_comment(&user, id, &payload.texto)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// POST /api/service-orders/{id}/time-entries
#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/time-entries",
    tag = "Timeline",
    request_body = TimeEntryPayload,
    responses(
        (status = 201, description = "Apontamento de tempo registrado", body = TimelineEvent)
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn add_time_entry(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TimeEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let event = app_state
        .order_service
        .add_time_entry(&user, id, payload.tempo, payload.descricao.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// POST /api/service-orders/{id}/attachments
#[utoipa::path(
    post,
    path = "/api/service-orders/{id}/attachments",
    tag = "Timeline",
    request_body = AttachmentPayload,
    responses(
        (status = 201, description = "Anexo registrado na timeline", body = TimelineEvent)
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn add_attachment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let event = app_state
        .order_service
        .add_attachment(&user, id, &payload.nome, &payload.url)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// =============================================================================
//  DOCUMENTOS
// =============================================================================

// GET /api/service-orders/{id}/pdf — ficha imprimível
#[utoipa::path(
    get,
    path = "/api/service-orders/{id}/pdf",
    tag = "Documents",
    responses(
        (status = 200, description = "Ficha da OS em PDF", content_type = "application/pdf"),
        (status = 404, description = "OS não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da OS")),
    security(("api_jwt" = []))
)]
pub async fn order_pdf(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // A leitura é autorizada aqui; o serviço de documentos só renderiza
    let order = app_state.order_service.get(&user, id).await?;
    let bytes = app_state.document_service.generate_order_sheet(&order).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        bytes,
    ))
}
