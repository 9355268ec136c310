// src/models/regions.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::common::geo::Coordinates;

/// Um agrupamento geográfico de endereços de entrega. O centróide é a
/// média aritmética de todos os endereços já anexados e é recalculado a
/// cada anexação; regiões nunca são removidas em operação normal.
///
/// Invariantes: `radius_km > 0` e `max_deliveries_per_day >= 1`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_km: f64,
    pub max_deliveries_per_day: i32,
}

impl Region {
    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.center_lat, self.center_lng)
    }
}

#[derive(Debug, Clone)]
pub struct NewRegion {
    pub tenant_id: Uuid,
    pub name: String,
    pub center: Coordinates,
    pub radius_km: f64,
    pub max_deliveries_per_day: i32,
}

/// Registro histórico imutável de um endereço entregue/planejado.
/// Serve de base tanto para o recálculo do centróide quanto para a
/// contagem de carga diária da região (a cota conta ESTAS linhas, não
/// as entregas das rotas, para tolerar entregas criadas antes da rota).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RegionAddress {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub region_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub address_text: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegionAddress {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub struct NewRegionAddress {
    pub tenant_id: Uuid,
    pub region_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub address_text: Option<String>,
    pub coordinates: Coordinates,
}
