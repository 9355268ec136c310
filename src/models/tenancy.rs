// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// O locatário (empresa) dono de todos os demais registros. As colunas
/// `default_*` são a política da empresa para regiões novas; `None` cai
/// nos padrões globais de agendamento.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub industry: String,
    pub contact_email: Option<String>,
    pub default_radius_km: Option<f64>,
    pub default_max_deliveries: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    #[validate(length(min = 1, max = 150, message = "nome é obrigatório"))]
    pub name: String,
    pub industry: Option<String>,
    #[validate(email(message = "e-mail de contato inválido"))]
    pub contact_email: Option<String>,
    pub default_radius_km: Option<f64>,
    pub default_max_deliveries: Option<i32>,
}
