// src/config.rs

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::db::postgres::PgStore;
use crate::models::tenancy::Tenant;
use crate::services::capacity_service::CapacityService;
use crate::services::geocoding::MapboxGeocoder;
use crate::services::region_service::RegionService;
use crate::services::scheduling_service::SchedulingService;
use crate::services::suggestion_service::SuggestionService;

/// Todos os padrões de agendamento em UM lugar. Nenhum outro módulo
/// inventa valores: quem precisa de um padrão resolve a política aqui.
#[derive(Debug, Clone)]
pub struct SchedulingDefaults {
    /// Raio (km) de uma região recém-criada.
    pub radius_km: f64,
    /// Cota diária de entregas de uma região recém-criada.
    pub max_deliveries_per_day: i32,
    /// Limite de paradas de uma rota criada pelo agendador.
    pub run_capacity: i32,
    /// Orçamento de minutos de um dia de trabalho por rota.
    pub workday_minutes: i64,
    /// Minutos por parada quando a categoria do produto é desconhecida.
    pub stop_minutes_default: i64,
    /// Teto de busca do casamento de regiões, além do raio de cada região.
    pub search_radius_km: f64,
    /// Janela padrão (dias) do motor de sugestões.
    pub window_days: u32,
    /// Minutos por parada por categoria de produto (chaves normalizadas).
    pub slot_minutes: HashMap<String, i64>,
}

impl Default for SchedulingDefaults {
    fn default() -> Self {
        let slot_minutes = HashMap::from([
            ("colchao_casal".to_string(), 15),
            ("dois_colchoes_solteiro".to_string(), 15),
            ("boxspring".to_string(), 30),
            ("base_com_colchao".to_string(), 30),
            ("boxspring_eletrica".to_string(), 60),
        ]);
        Self {
            radius_km: 30.0,
            max_deliveries_per_day: 13,
            run_capacity: 10,
            workday_minutes: 480,
            stop_minutes_default: 15,
            search_radius_km: 50.0,
            window_days: 30,
            slot_minutes,
        }
    }
}

impl SchedulingDefaults {
    /// Sobrepõe os padrões globais com as colunas de política do locatário.
    pub fn for_tenant(&self, tenant: &Tenant) -> TenantPolicy {
        TenantPolicy {
            radius_km: tenant.default_radius_km.unwrap_or(self.radius_km),
            max_deliveries_per_day: tenant
                .default_max_deliveries
                .unwrap_or(self.max_deliveries_per_day),
            run_capacity: self.run_capacity,
            workday_minutes: self.workday_minutes,
            stop_minutes_default: self.stop_minutes_default,
            search_radius_km: self.search_radius_km,
            window_days: self.window_days,
            slot_minutes: self.slot_minutes.clone(),
        }
    }
}

/// A política efetiva de um locatário, resolvida uma vez por requisição.
#[derive(Debug, Clone)]
pub struct TenantPolicy {
    pub radius_km: f64,
    pub max_deliveries_per_day: i32,
    pub run_capacity: i32,
    pub workday_minutes: i64,
    pub stop_minutes_default: i64,
    pub search_radius_km: f64,
    pub window_days: u32,
    pub slot_minutes: HashMap<String, i64>,
}

impl TenantPolicy {
    /// Minutos de uma parada para a categoria (ou nome) de produto dada.
    /// A chave é normalizada; desconhecida cai no padrão.
    pub fn stop_minutes(&self, category_or_name: &str) -> i64 {
        let key = category_or_name.trim().to_lowercase();
        self.slot_minutes
            .get(&key)
            .copied()
            .unwrap_or(self.stop_minutes_default)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub mapbox_token: Option<String>,
    pub defaults: SchedulingDefaults,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let mapbox_token = env::var("MAPBOX_TOKEN").ok();

        let mut defaults = SchedulingDefaults::default();
        if let Ok(raw) = env::var("DEFAULT_RADIUS_KM") {
            defaults.radius_km = raw.parse().context("DEFAULT_RADIUS_KM inválido")?;
        }
        if let Ok(raw) = env::var("DEFAULT_MAX_DELIVERIES") {
            defaults.max_deliveries_per_day =
                raw.parse().context("DEFAULT_MAX_DELIVERIES inválido")?;
        }

        Ok(Self {
            database_url,
            mapbox_token,
            defaults,
        })
    }
}

// O estado compartilhado que a camada web recebe pronto.
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub regions: RegionService<PgStore>,
    pub capacity: CapacityService<PgStore>,
    pub scheduling: SchedulingService<PgStore>,
    pub suggestions: SuggestionService<PgStore>,
    pub geocoder: Option<MapboxGeocoder>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        crate::db::postgres::run_migrations(&db_pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        let store = PgStore::new(db_pool);

        // --- Monta o gráfico de dependências ---
        let defaults = config.defaults.clone();
        let regions = RegionService::new(store.clone(), defaults.clone());
        let capacity = CapacityService::new(store.clone());
        let scheduling = SchedulingService::new(store.clone(), defaults.clone());
        let suggestions = SuggestionService::new(store.clone(), defaults);
        let geocoder = config.mapbox_token.map(MapboxGeocoder::new);

        Ok(Self {
            store,
            regions,
            capacity,
            scheduling,
            suggestions,
            geocoder,
        })
    }
}
