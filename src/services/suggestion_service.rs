// src/services/suggestion_service.rs

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::geo::{Coordinates, RegionMatch, match_candidates};
use crate::config::SchedulingDefaults;
use crate::db::{Store, StoreRead};
use crate::services::capacity_service::{day_capacity, day_counts};
use crate::services::geocoding::Geocoder;

/// Uma data candidata para uma entrega ainda não agendada. Uma entrada
/// por data na lista final; a região é a melhor classificada do dia.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSuggestion {
    pub date: NaiveDate,
    pub region_id: Uuid,
    pub region_name: String,
    pub distance_km: f64,
    pub deliveries_scheduled: i64,
    pub spots_left: i64,
    pub drivers_left: i64,
    pub trucks_left: i64,
}

/// Classificação em duas partições: primeiro as datas em que a região
/// já tem entrega (reforçar uma região próxima já ativa), por distância
/// e depois data; depois as vazias, por data e depois distância. Por
/// fim, uma entrada por data, mantendo a melhor.
pub fn rank_suggestions(mut candidates: Vec<DateSuggestion>) -> Vec<DateSuggestion> {
    let (mut busy, mut empty): (Vec<_>, Vec<_>) = candidates
        .drain(..)
        .partition(|c| c.deliveries_scheduled > 0);

    busy.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.date.cmp(&b.date))
    });
    empty.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.distance_km.total_cmp(&b.distance_km))
    });

    let mut seen = HashSet::new();
    busy.into_iter()
        .chain(empty)
        .filter(|c| seen.insert(c.date))
        .collect()
}

// O motor de sugestões: roda o mesmo funil do agendamento, só leitura,
// sobre a janela de datas. Nada é gravado; tudo é revalidado na hora de
// agendar de verdade.
#[derive(Clone)]
pub struct SuggestionService<S: Store> {
    store: S,
    defaults: SchedulingDefaults,
}

impl<S: Store> SuggestionService<S> {
    pub fn new(store: S, defaults: SchedulingDefaults) -> Self {
        Self { store, defaults }
    }

    pub async fn suggest_dates(
        &self,
        tenant_id: Uuid,
        point: Coordinates,
        window_days: Option<u32>,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        self.suggest_dates_from(tenant_id, point, window_days, Utc::now().date_naive())
            .await
    }

    /// Variante com início explícito da janela (determinística).
    pub async fn suggest_dates_from(
        &self,
        tenant_id: Uuid,
        point: Coordinates,
        window_days: Option<u32>,
        start: NaiveDate,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        point.validate()?;
        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound("locatário"))?;
        let policy = self.defaults.for_tenant(&tenant);

        let regions = self.store.regions(tenant_id).await?;
        let matches = match_candidates(&regions, point, policy.search_radius_km);
        let window = window_days.unwrap_or(policy.window_days);

        self.collect(tenant_id, &matches, window, start).await
    }

    /// Caso sem coordenadas: a região já é conhecida (seleção manual).
    pub async fn suggest_dates_for_region(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        window_days: Option<u32>,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        self.suggest_dates_for_region_from(tenant_id, region_id, window_days, Utc::now().date_naive())
            .await
    }

    pub async fn suggest_dates_for_region_from(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        window_days: Option<u32>,
        start: NaiveDate,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        let tenant = self
            .store
            .tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound("locatário"))?;
        let policy = self.defaults.for_tenant(&tenant);

        let region = self
            .store
            .region(tenant_id, region_id)
            .await?
            .ok_or(AppError::NotFound("região"))?;
        let matches = vec![RegionMatch {
            region,
            distance_km: 0.0,
        }];
        let window = window_days.unwrap_or(policy.window_days);

        self.collect(tenant_id, &matches, window, start).await
    }

    /// Conveniência: geocodifica o endereço e sugere datas. A falha do
    /// geocodificador sobe como erro; a seleção manual de região é o
    /// caminho alternativo.
    pub async fn suggest_for_address<G: Geocoder>(
        &self,
        geocoder: &G,
        tenant_id: Uuid,
        address: &str,
        window_days: Option<u32>,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        let point = geocoder.geocode(address).await?;
        self.suggest_dates(tenant_id, point, window_days).await
    }

    async fn collect(
        &self,
        tenant_id: Uuid,
        matches: &[RegionMatch],
        window_days: u32,
        start: NaiveDate,
    ) -> Result<Vec<DateSuggestion>, AppError> {
        let mut candidates = Vec::new();

        for offset in 0..i64::from(window_days) {
            let date = start + Duration::days(offset);

            let counts = day_counts(&self.store, tenant_id, date).await?;
            let day = day_capacity(date, &counts);
            if !day.is_valid {
                continue;
            }

            for candidate in matches {
                let current = self
                    .store
                    .region_delivery_count(tenant_id, candidate.region.id, date)
                    .await?;
                let max = i64::from(candidate.region.max_deliveries_per_day);
                if current >= max {
                    continue;
                }
                candidates.push(DateSuggestion {
                    date,
                    region_id: candidate.region.id,
                    region_name: candidate.region.name.clone(),
                    distance_km: candidate.distance_km,
                    deliveries_scheduled: current,
                    spots_left: max - current,
                    drivers_left: day.drivers_left,
                    trucks_left: day.trucks_left,
                });
            }
        }

        Ok(rank_suggestions(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(
        day: u32,
        deliveries: i64,
        distance_km: f64,
        region_name: &str,
    ) -> DateSuggestion {
        DateSuggestion {
            date: NaiveDate::from_ymd_opt(2026, 9, day).unwrap(),
            region_id: Uuid::new_v4(),
            region_name: region_name.to_string(),
            distance_km,
            deliveries_scheduled: deliveries,
            spots_left: 10 - deliveries,
            drivers_left: 1,
            trucks_left: 1,
        }
    }

    #[test]
    fn busy_regions_rank_before_empty_even_on_later_dates() {
        // Dia 3 com carga na região vem antes do dia 1 vazio.
        let ranked = rank_suggestions(vec![
            suggestion(1, 0, 2.0, "Norte"),
            suggestion(3, 2, 2.0, "Norte"),
        ]);

        assert_eq!(ranked[0].date, NaiveDate::from_ymd_opt(2026, 9, 3).unwrap());
        assert_eq!(ranked[1].date, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn busy_partition_prefers_distance_then_date() {
        let ranked = rank_suggestions(vec![
            suggestion(2, 1, 8.0, "Longe"),
            suggestion(5, 1, 1.0, "Perto"),
        ]);

        assert_eq!(ranked[0].region_name, "Perto");
        assert_eq!(ranked[1].region_name, "Longe");
    }

    #[test]
    fn empty_partition_prefers_date_then_distance() {
        let ranked = rank_suggestions(vec![
            suggestion(4, 0, 1.0, "Perto"),
            suggestion(2, 0, 8.0, "Longe"),
        ]);

        assert_eq!(ranked[0].region_name, "Longe");
        assert_eq!(ranked[1].region_name, "Perto");
    }

    #[test]
    fn one_entry_per_date_keeps_the_best_ranked() {
        let ranked = rank_suggestions(vec![
            suggestion(2, 1, 5.0, "B"),
            suggestion(2, 1, 1.0, "A"),
            suggestion(2, 0, 0.5, "C"),
        ]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].region_name, "A");
    }
}
