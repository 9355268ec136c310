// src/models/fleet.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

// Papéis como enum fechado, mapeado para o enum nativo do Postgres.
// A lógica de negócio nunca compara strings cruas de papel/status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum EmployeeRole {
    Seller,
    Driver,
    Manager,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub role: EmployeeRole,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub role: EmployeeRole,
}

/// Disponibilidade de um funcionário em uma data exata. Um motorista só
/// conta como disponível no dia se ele estiver ativo E existir uma linha
/// ativa aqui para a data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub available_date: NaiveDate,
    pub active: bool,
}

/// Caminhões são um pool por locatário; só ficam vinculados a uma rota
/// quando atribuídos. A frota não é escopada por data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTruck {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
