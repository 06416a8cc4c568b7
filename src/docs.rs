// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Team ---
        handlers::team::list_members,
        handlers::team::add_member,
        handlers::team::update_member,
        handlers::team::deactivate_member,

        // --- CRM ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::update_customer,
        handlers::crm::deactivate_customer,

        // --- Service Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order,
        handlers::orders::delete_order,
        handlers::orders::change_status,
        handlers::orders::transfer_order,

        // --- Timeline ---
        handlers::orders::list_events,
        handlers::orders::list_transfers,
        handlers::orders::add_comment,
        handlers::orders::add_time_entry,
        handlers::orders::add_attachment,

        // --- Documents ---
        handlers::orders::order_pdf,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Organization,

            // --- CRM ---
            models::crm::Customer,
            handlers::crm::CreateCustomerPayload,
            handlers::crm::UpdateCustomerPayload,

            // --- Service Orders ---
            models::orders::OrderStatus,
            models::orders::OrderPriority,
            models::orders::ServiceOrder,
            handlers::orders::CreateOrderPayload,
            handlers::orders::UpdateOrderPayload,
            handlers::orders::ChangeStatusPayload,
            handlers::orders::TransferPayload,
            handlers::orders::CommentPayload,
            handlers::orders::TimeEntryPayload,
            handlers::orders::AttachmentPayload,

            // --- Timeline ---
            models::timeline::EventType,
            models::timeline::TimelineEvent,
            models::timeline::UserRef,
            models::timeline::TransferRecord,

            // --- Team ---
            handlers::team::AddMemberPayload,
            handlers::team::UpdateMemberPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Team", description = "Gestão de Equipe"),
        (name = "CRM", description = "Gestão de Clientes"),
        (name = "Service Orders", description = "Ciclo de Vida das Ordens de Serviço"),
        (name = "Timeline", description = "Linha do Tempo e Anotações"),
        (name = "Documents", description = "Fichas e Documentos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
