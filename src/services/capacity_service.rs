// src/services/capacity_service.rs

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::common::error::{AppError, RuleViolation};
use crate::config::TenantPolicy;
use crate::db::{Store, StoreRead};
use crate::models::orders::OrderLine;

/// Sentinela para recursos sem limite configurado (locatário ainda sem
/// frota ou sem motoristas cadastrados).
pub const UNCONSTRAINED: i64 = i64::MAX;

/// Retrato dos recursos de um locatário em uma data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCounts {
    pub drivers_total: i64,
    pub drivers_available: i64,
    pub trucks_total: i64,
    pub active_regions: i64,
    pub deliveries_total: i64,
}

/// Resultado estruturado da checagem de um dia, pronto para a camada de
/// exibição. `reason` é a mesma mensagem que o alocador levantaria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCapacity {
    pub date: NaiveDate,
    pub is_valid: bool,
    pub reason: Option<String>,
    pub drivers_left: i64,
    pub trucks_left: i64,
    pub active_regions: i64,
    pub total_deliveries: i64,
}

/// As regras de validade de um dia. Locatário sem o recurso configurado
/// não é restringido por ele; não existe regra comparando o total de
/// entregas com o número de motoristas.
pub fn check_day(date: NaiveDate, counts: &DayCounts) -> Option<RuleViolation> {
    if counts.drivers_total > 0 && counts.drivers_available == 0 {
        return Some(RuleViolation::NoDriverAvailable { date });
    }
    // O "+1" reserva um caminhão para uma possível região nova no dia,
    // mesmo quando a requisição é para uma região existente.
    if counts.trucks_total > 0 && counts.active_regions + 1 > counts.trucks_total {
        return Some(RuleViolation::TruckFleetExhausted {
            date,
            active: counts.active_regions,
            trucks: counts.trucks_total,
        });
    }
    None
}

pub fn day_capacity(date: NaiveDate, counts: &DayCounts) -> DayCapacity {
    let violation = check_day(date, counts);
    DayCapacity {
        date,
        is_valid: violation.is_none(),
        reason: violation.map(|v| v.to_string()),
        drivers_left: if counts.drivers_total == 0 {
            UNCONSTRAINED
        } else {
            counts.drivers_available
        },
        trucks_left: if counts.trucks_total == 0 {
            UNCONSTRAINED
        } else {
            (counts.trucks_total - counts.active_regions).max(0)
        },
        active_regions: counts.active_regions,
        total_deliveries: counts.deliveries_total,
    }
}

/// Minutos totais das linhas de pedido: categoria (ou, na falta dela, o
/// nome do produto) na tabela de durações, vezes a quantidade.
pub fn total_minutes(policy: &TenantPolicy, lines: &[OrderLine]) -> i64 {
    lines
        .iter()
        .map(|line| {
            let key = line.category.as_deref().unwrap_or(&line.product_name);
            policy.stop_minutes(key) * i64::from(line.quantity)
        })
        .sum()
}

pub(crate) async fn day_counts<R: StoreRead>(
    store: &R,
    tenant_id: Uuid,
    date: NaiveDate,
) -> Result<DayCounts, AppError> {
    Ok(DayCounts {
        drivers_total: store.count_drivers(tenant_id).await?,
        drivers_available: store.count_available_drivers(tenant_id, date).await?,
        trucks_total: store.count_trucks(tenant_id).await?,
        active_regions: store.count_active_regions(tenant_id, date).await?,
        deliveries_total: store.count_deliveries(tenant_id, date).await?,
    })
}

// O razão de capacidade: só agregações, nenhuma escrita. Roda sem trava
// ao lado dos escritores; contagens levemente defasadas são aceitáveis
// porque tudo é revalidado dentro da transação na hora de agendar.
#[derive(Clone)]
pub struct CapacityService<S: Store> {
    store: S,
}

impl<S: Store> CapacityService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn capacity_info(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<DayCapacity, AppError> {
        let counts = day_counts(&self.store, tenant_id, date).await?;
        Ok(day_capacity(date, &counts))
    }

    pub async fn available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        self.store.count_available_drivers(tenant_id, date).await
    }

    pub async fn available_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        self.store.count_trucks(tenant_id).await
    }

    pub async fn active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        self.store.count_active_regions(tenant_id, date).await
    }

    pub async fn total_deliveries(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        self.store.count_deliveries(tenant_id, date).await
    }

    pub async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        self.store
            .region_delivery_count(tenant_id, region_id, date)
            .await
    }
}
