// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        CustomerRepository, OrderRepository, OrganizationRepository, TimelineRepository,
        UserRepository,
    },
    services::{
        auth::AuthService, crm_service::CustomerService, document_service::DocumentService,
        order_service::OrderService, team_service::TeamService,
        timeline_service::TimelineService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub team_service: TeamService,
    pub customer_service: CustomerService,
    pub order_service: OrderService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let font_dir = env::var("FONT_DIR").unwrap_or_else(|_| "./fonts".to_string());

        // Toda chamada ao banco fica limitada pelo acquire_timeout: estouro vira
        // erro transiente, nunca mutação parcial.
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let timeline_repo = TimelineRepository::new(db_pool.clone());

        let timeline_service = TimelineService::new(timeline_repo);

        let auth_service = AuthService::new(
            user_repo.clone(),
            org_repo.clone(),
            jwt_secret,
            db_pool.clone(),
        );
        let team_service = TeamService::new(user_repo.clone(), db_pool.clone());
        let customer_service = CustomerService::new(customer_repo.clone(), db_pool.clone());
        let order_service = OrderService::new(
            order_repo,
            user_repo.clone(),
            customer_repo.clone(),
            timeline_service,
            db_pool.clone(),
        );
        let document_service = DocumentService::new(
            org_repo,
            user_repo,
            customer_repo,
            db_pool.clone(),
            font_dir,
        );

        Ok(Self {
            db_pool,
            auth_service,
            team_service,
            customer_service,
            order_service,
            document_service,
        })
    }
}
