// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é proposital: sem configuração válida a aplicação não deve subir.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let team_routes = Router::new()
        .route(
            "/",
            post(handlers::team::add_member).get(handlers::team::list_members),
        )
        .route(
            "/{id}",
            patch(handlers::team::update_member).delete(handlers::team::deactivate_member),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route(
            "/{id}",
            patch(handlers::crm::update_customer).delete(handlers::crm::deactivate_customer),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/{id}",
            get(handlers::orders::get_order)
                .patch(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route("/{id}/status", patch(handlers::orders::change_status))
        .route("/{id}/transfer", post(handlers::orders::transfer_order))
        .route("/{id}/events", get(handlers::orders::list_events))
        .route("/{id}/transfers", get(handlers::orders::list_transfers))
        .route("/{id}/comments", post(handlers::orders::add_comment))
        .route("/{id}/time-entries", post(handlers::orders::add_time_entry))
        .route("/{id}/attachments", post(handlers::orders::add_attachment))
        .route("/{id}/pdf", get(handlers::orders::order_pdf))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/team", team_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/service-orders", order_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
