// src/models/runs.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "run_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// Criada manualmente (fluxo "adicionar caminhão"); ainda não ocupada.
    Planned,
    /// Criada pelo agendador ao anexar a primeira entrega.
    InProgress,
    Completed,
    Cancelled,
}

impl RunStatus {
    /// Rotas encerradas não recebem mais entregas nem contam no upsert.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum DeliveryStatus {
    Scheduled,
    Delivered,
    Cancelled,
}

/// A carga de trabalho de um caminhão/motorista para uma região em uma
/// data. `capacity` é o limite opcional de paradas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRun {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub region_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub truck_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub status: RunStatus,
}

#[derive(Debug, Clone)]
pub struct NewRun {
    pub tenant_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub region_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub truck_id: Option<Uuid>,
    pub capacity: Option<i32>,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub run_id: Uuid,
    pub delivery_status: DeliveryStatus,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub run_id: Uuid,
}

/// Linha da listagem de entregas (join pronto para a camada de exibição).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOverviewRow {
    pub delivery_id: Uuid,
    pub order_id: Uuid,
    pub delivery_status: DeliveryStatus,
    pub region_id: Option<Uuid>,
    pub region_name: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub order_date: Option<NaiveDate>,
}
