// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Cliente da organização. O documento (CPF/CNPJ) é único por organização.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(ignore)]
    pub organization_id: Uuid,

    #[schema(example = "Maria Souza")]
    pub name: String,

    #[schema(example = "123.456.789-00")]
    pub document: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
