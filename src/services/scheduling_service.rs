// src/services/scheduling_service.rs

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::{AppError, RuleViolation};
use crate::common::geo::{Coordinates, match_candidates};
use crate::config::{SchedulingDefaults, TenantPolicy};
use crate::db::{Store, StoreRead, StoreTx};
use crate::models::regions::{NewRegion, NewRegionAddress, Region};
use crate::models::runs::{DeliveryOverviewRow, NewDelivery, NewRun, RunStatus};
use crate::services::capacity_service::{check_day, day_counts, total_minutes};
use crate::services::region_service::{attach_address, synthesized_region_name};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub scheduled_date: NaiveDate,
    /// Região escolhida manualmente; na ausência, o casamento geográfico
    /// decide a partir das coordenadas.
    pub region_id: Option<Uuid>,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
    #[validate(length(max = 200, message = "endereço longo demais"))]
    pub address: Option<String>,
    /// Rótulo de município para batizar uma região recém-criada.
    pub municipality: Option<String>,
    pub driver_id: Option<Uuid>,
    /// Permite criar uma região nova quando nenhuma existente serve.
    #[serde(default = "default_true")]
    pub create_region: bool,
}

impl ScheduleRequest {
    pub fn new(tenant_id: Uuid, order_id: Uuid, scheduled_date: NaiveDate) -> Self {
        Self {
            tenant_id,
            order_id,
            scheduled_date,
            region_id: None,
            coordinates: None,
            address: None,
            municipality: None,
            driver_id: None,
            create_region: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledDelivery {
    pub delivery_id: Uuid,
    pub run_id: Uuid,
    pub region_id: Uuid,
    pub scheduled_date: NaiveDate,
}

// O alocador: casa a região, valida capacidade e grava rota + entrega
// dentro de UMA transação. Qualquer falha desfaz tudo.
#[derive(Clone)]
pub struct SchedulingService<S: Store> {
    store: S,
    defaults: SchedulingDefaults,
}

impl<S: Store> SchedulingService<S> {
    pub fn new(store: S, defaults: SchedulingDefaults) -> Self {
        Self { store, defaults }
    }

    pub async fn schedule_delivery(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduledDelivery, AppError> {
        request.validate()?;
        if request.scheduled_date < Utc::now().date_naive() {
            return Err(RuleViolation::DateInPast(request.scheduled_date).into());
        }

        let tx = self.store.begin().await?;
        match self.schedule_in_tx(&tx, &request).await {
            Ok(scheduled) => {
                tx.commit().await?;
                tracing::info!(
                    delivery = %scheduled.delivery_id,
                    run = %scheduled.run_id,
                    date = %scheduled.scheduled_date,
                    "entrega agendada"
                );
                Ok(scheduled)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = ?rollback_err, "falha ao desfazer a transação de agendamento");
                }
                if !err.is_business_rule() {
                    // Falha inesperada: log com contexto completo; o
                    // usuário recebe só o erro genérico.
                    tracing::error!(
                        error = ?err,
                        tenant = %request.tenant_id,
                        order = %request.order_id,
                        date = %request.scheduled_date,
                        "falha inesperada ao agendar entrega"
                    );
                }
                Err(err)
            }
        }
    }

    async fn schedule_in_tx(
        &self,
        tx: &S::Tx,
        request: &ScheduleRequest,
    ) -> Result<ScheduledDelivery, AppError> {
        let tenant_id = request.tenant_id;
        let date = request.scheduled_date;

        // 1. Resolve a política do locatário uma única vez
        let tenant = tx
            .tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound("locatário"))?;
        let policy = self.defaults.for_tenant(&tenant);

        // 2. O pedido precisa existir
        tx.order(tenant_id, request.order_id)
            .await?
            .ok_or(AppError::NotFound("pedido"))?;

        // 3. Resolve a região (explícita, casada ou recém-criada)
        let region = self.resolve_region(tx, request, &policy).await?;

        // 4. Pré-checagem do razão de capacidade para o dia
        let counts = day_counts(tx, tenant_id, date).await?;
        if let Some(violation) = check_day(date, &counts) {
            return Err(violation.into());
        }

        // 5. Motorista: o pedido manda, senão o primeiro disponível
        let driver_id = match request.driver_id {
            Some(driver) => Some(driver),
            None => tx
                .available_driver_ids(tenant_id, date)
                .await?
                .first()
                .copied(),
        };

        // 6. Busca ou cria a rota, sob a trava de linha
        let run = match tx.lock_run(tenant_id, region.id, date).await? {
            Some(run) => run,
            None => {
                tx.insert_run(NewRun {
                    tenant_id,
                    scheduled_date: date,
                    region_id: region.id,
                    driver_id,
                    truck_id: None,
                    capacity: Some(policy.run_capacity),
                    // in_progress distingue a rota do agendador de um
                    // caminhão adicionado manualmente (planned).
                    status: RunStatus::InProgress,
                })
                .await?
            }
        };

        // 7a. Cota diária da região
        let current = tx
            .region_delivery_count(tenant_id, region.id, date)
            .await?;
        if current >= i64::from(region.max_deliveries_per_day) {
            return Err(RuleViolation::RegionQuotaExceeded {
                region: region.name.clone(),
                date,
                current,
                max: region.max_deliveries_per_day,
            }
            .into());
        }

        // 7b. Orçamento de minutos da rota
        let requested = total_minutes(&policy, &tx.order_lines(tenant_id, request.order_id).await?);
        let used = total_minutes(&policy, &tx.run_lines(tenant_id, run.id).await?);
        if used + requested > policy.workday_minutes {
            return Err(RuleViolation::TimeBudgetExceeded {
                date,
                used,
                requested,
                budget: policy.workday_minutes,
            }
            .into());
        }

        // 7c. Limite de paradas da rota
        if let Some(capacity) = run.capacity {
            let stops = tx.count_run_deliveries(tenant_id, run.id).await?;
            if stops + 1 > i64::from(capacity) {
                return Err(RuleViolation::StopLimitReached {
                    date,
                    max: capacity,
                }
                .into());
            }
        }

        // 8. Endereço histórico + recálculo do centróide. Sem
        // coordenadas, usa o centro atual da região: a contagem de cota
        // permanece uniforme e a média não se move.
        let coordinates = request.coordinates.unwrap_or_else(|| region.center());
        attach_address(
            tx,
            NewRegionAddress {
                tenant_id,
                region_id: region.id,
                scheduled_date: date,
                address_text: request.address.clone(),
                coordinates,
            },
        )
        .await?;

        // 9. A entrega em si
        let delivery = tx
            .insert_delivery(NewDelivery {
                tenant_id,
                order_id: request.order_id,
                run_id: run.id,
            })
            .await?;

        Ok(ScheduledDelivery {
            delivery_id: delivery.id,
            run_id: run.id,
            region_id: region.id,
            scheduled_date: date,
        })
    }

    /// Região explícita; senão a candidata mais próxima com cota livre
    /// no dia (as lotadas são puladas); senão uma região nova com a
    /// política do locatário, quando permitido.
    async fn resolve_region(
        &self,
        tx: &S::Tx,
        request: &ScheduleRequest,
        policy: &TenantPolicy,
    ) -> Result<Region, AppError> {
        let tenant_id = request.tenant_id;

        if let Some(region_id) = request.region_id {
            return tx
                .region(tenant_id, region_id)
                .await?
                .ok_or(AppError::NotFound("região"));
        }

        let Some(point) = request.coordinates else {
            return Err(RuleViolation::MissingRegion.into());
        };

        let regions = tx.regions(tenant_id).await?;
        let candidates = match_candidates(&regions, point, policy.search_radius_km);
        for candidate in &candidates {
            let current = tx
                .region_delivery_count(tenant_id, candidate.region.id, request.scheduled_date)
                .await?;
            if current < i64::from(candidate.region.max_deliveries_per_day) {
                return Ok(candidate.region.clone());
            }
            tracing::debug!(
                region = %candidate.region.name,
                date = %request.scheduled_date,
                "região candidata na cota; tentando a próxima"
            );
        }

        if !request.create_region {
            return Err(RuleViolation::OutsideDeliveryRegions.into());
        }

        let name = request
            .municipality
            .clone()
            .unwrap_or_else(|| synthesized_region_name(request.scheduled_date));
        let region = tx
            .insert_region(NewRegion {
                tenant_id,
                name,
                center: point,
                radius_km: policy.radius_km,
                max_deliveries_per_day: policy.max_deliveries_per_day,
            })
            .await?;
        tracing::info!(region = %region.name, tenant = %tenant_id, "nova região de entrega criada");
        Ok(region)
    }

    /// Listagem de entregas com região e datas, filtros opcionais.
    pub async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError> {
        self.store
            .delivery_overview(tenant_id, region_id, date)
            .await
    }
}
