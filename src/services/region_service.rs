// src/services/region_service.rs

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::geo::{Coordinates, RegionMatch, centroid_of, match_candidates};
use crate::config::SchedulingDefaults;
use crate::db::{Store, StoreRead, StoreTx};
use crate::models::regions::{NewRegion, NewRegionAddress, Region};

#[derive(Clone)]
pub struct RegionService<S: Store> {
    store: S,
    defaults: SchedulingDefaults,
}

impl<S: Store> RegionService<S> {
    pub fn new(store: S, defaults: SchedulingDefaults) -> Self {
        Self { store, defaults }
    }

    /// Regiões candidatas para o ponto, da mais próxima para a mais
    /// distante. Lista vazia: o chamador decide criar uma região nova.
    pub async fn match_regions(
        &self,
        tenant_id: Uuid,
        point: Coordinates,
        max_radius_km: Option<f64>,
    ) -> Result<Vec<RegionMatch>, AppError> {
        point.validate()?;
        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound("locatário"))?;
        let policy = self.defaults.for_tenant(&tenant);

        let cap_km = max_radius_km.unwrap_or(policy.search_radius_km);
        let regions = self.store.regions(tenant_id).await?;
        Ok(match_candidates(&regions, point, cap_km))
    }

    /// Anexa um endereço à região e devolve o centróide recalculado.
    pub async fn attach_address_to_region(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        address: Option<&str>,
        point: Coordinates,
        date: NaiveDate,
    ) -> Result<Coordinates, AppError> {
        point.validate()?;
        let tx = self.store.begin().await?;

        let result = async {
            tx.region(tenant_id, region_id)
                .await?
                .ok_or(AppError::NotFound("região"))?;
            attach_address(
                &tx,
                NewRegionAddress {
                    tenant_id,
                    region_id,
                    scheduled_date: date,
                    address_text: address.map(str::to_string),
                    coordinates: point,
                },
            )
            .await
        }
        .await;

        match result {
            Ok(center) => {
                tx.commit().await?;
                Ok(center)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = ?rollback_err, "falha ao desfazer a anexação de endereço");
                }
                Err(err)
            }
        }
    }

    /// Cria uma região nova já com o primeiro endereço anexado. Nome cai
    /// no rótulo do município ou em um nome sintetizado pela data; raio e
    /// cota vêm da política do locatário, nunca de constantes.
    pub async fn create_region_with_address(
        &self,
        tenant_id: Uuid,
        name: Option<&str>,
        address: Option<&str>,
        point: Coordinates,
        date: NaiveDate,
    ) -> Result<Region, AppError> {
        point.validate()?;
        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound("locatário"))?;
        let policy = self.defaults.for_tenant(&tenant);

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| synthesized_region_name(date));

        let tx = self.store.begin().await?;
        let result = async {
            let region = tx
                .insert_region(NewRegion {
                    tenant_id,
                    name,
                    center: point,
                    radius_km: policy.radius_km,
                    max_deliveries_per_day: policy.max_deliveries_per_day,
                })
                .await?;
            attach_address(
                &tx,
                NewRegionAddress {
                    tenant_id,
                    region_id: region.id,
                    scheduled_date: date,
                    address_text: address.map(str::to_string),
                    coordinates: point,
                },
            )
            .await?;
            Ok::<_, AppError>(region)
        }
        .await;

        match result {
            Ok(region) => {
                tx.commit().await?;
                tracing::info!(region = %region.name, tenant = %tenant_id, "nova região de entrega criada");
                Ok(region)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = ?rollback_err, "falha ao desfazer a criação de região");
                }
                Err(err)
            }
        }
    }
}

pub(crate) fn synthesized_region_name(date: NaiveDate) -> String {
    format!("Região {date}")
}

/// Insere o endereço histórico e recalcula o centróide da região como a
/// média de TODOS os endereços, incluindo o novo. Recálculo completo a
/// cada anexação: a definição fica exata e idempotente.
pub(crate) async fn attach_address<T: StoreTx>(
    tx: &T,
    address: NewRegionAddress,
) -> Result<Coordinates, AppError> {
    let tenant_id = address.tenant_id;
    let region_id = address.region_id;
    tx.insert_region_address(address).await?;
    recompute_center(tx, tenant_id, region_id).await
}

pub(crate) async fn recompute_center<T: StoreTx>(
    tx: &T,
    tenant_id: Uuid,
    region_id: Uuid,
) -> Result<Coordinates, AppError> {
    let addresses = tx.region_addresses(tenant_id, region_id).await?;
    let points: Vec<Coordinates> = addresses.iter().map(|a| a.coordinates()).collect();
    let center = centroid_of(&points).ok_or_else(|| {
        AppError::InternalServerError(anyhow::anyhow!(
            "recálculo de centróide em região sem endereços"
        ))
    })?;
    tx.update_region_center(tenant_id, region_id, center).await?;
    Ok(center)
}
