// src/lib.rs
//
// Núcleo de agendamento de entregas multi-locatário: casamento
// geográfico de regiões, razão de capacidade e o alocador transacional
// de rotas. A camada web chama este crate em processo e recebe dados
// estruturados de volta.

pub mod common;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use common::error::{AppError, RuleViolation};
pub use common::geo::{Coordinates, RegionMatch, haversine_km};
pub use config::{AppConfig, AppState, SchedulingDefaults, TenantPolicy};
pub use db::{MemStore, PgStore, Store, StoreRead, StoreTx};
pub use services::capacity_service::{CapacityService, DayCapacity, UNCONSTRAINED};
pub use services::geocoding::{Geocoder, MapboxGeocoder};
pub use services::region_service::RegionService;
pub use services::scheduling_service::{ScheduleRequest, ScheduledDelivery, SchedulingService};
pub use services::suggestion_service::{DateSuggestion, SuggestionService};
