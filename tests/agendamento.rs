// tests/agendamento.rs
//
// Cenários de ponta a ponta sobre o store em memória: o mesmo funil que
// a produção roda contra o Postgres, sem banco.

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use entregas_core::common::geo::Coordinates;
use entregas_core::db::{MemStore, Store, StoreRead, StoreTx};
use entregas_core::models::fleet::{EmployeeRole, NewEmployee, NewTruck};
use entregas_core::models::orders::{CustomerOrder, NewOrder, NewOrderItem};
use entregas_core::models::regions::NewRegion;
use entregas_core::models::tenancy::{NewTenant, Tenant};
use entregas_core::services::capacity_service::{CapacityService, UNCONSTRAINED};
use entregas_core::services::region_service::RegionService;
use entregas_core::services::scheduling_service::{ScheduleRequest, SchedulingService};
use entregas_core::services::suggestion_service::SuggestionService;
use entregas_core::{AppError, RuleViolation, SchedulingDefaults};

const BRUSSELS: (f64, f64) = (50.85, 4.35);

fn point(lat: f64, lng: f64) -> Coordinates {
    Coordinates::new(lat, lng)
}

fn future_date(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

async fn seed_tenant(store: &MemStore, default_max_deliveries: Option<i32>) -> Tenant {
    store
        .insert_tenant(NewTenant {
            name: format!("Locatário {}", Uuid::new_v4()),
            industry: None,
            contact_email: None,
            default_radius_km: None,
            default_max_deliveries,
        })
        .await
        .unwrap()
}

/// Pedido de um item com a categoria e a quantidade dadas.
async fn seed_order(store: &MemStore, tenant_id: Uuid, category: &str, quantity: i32) -> CustomerOrder {
    let product = store
        .ensure_product(tenant_id, &format!("produto {category}"), Some(category))
        .await
        .unwrap();
    store
        .insert_order(NewOrder {
            tenant_id,
            customer_id: None,
            seller_id: None,
            order_date: Utc::now().date_naive(),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity,
            }],
        })
        .await
        .unwrap()
}

fn services(
    store: &MemStore,
    defaults: SchedulingDefaults,
) -> (
    RegionService<MemStore>,
    SchedulingService<MemStore>,
    SuggestionService<MemStore>,
    CapacityService<MemStore>,
) {
    (
        RegionService::new(store.clone(), defaults.clone()),
        SchedulingService::new(store.clone(), defaults.clone()),
        SuggestionService::new(store.clone(), defaults),
        CapacityService::new(store.clone()),
    )
}

// --- Cenário A: sem regiões, o casamento devolve vazio e a criação
// usa o ponto como centróide e os padrões do locatário ---
#[tokio::test]
async fn empty_match_then_create_region_with_point_centroid() {
    let store = MemStore::new();
    let (regions, _, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;

    let matches = regions
        .match_regions(tenant.id, point(BRUSSELS.0, BRUSSELS.1), None)
        .await
        .unwrap();
    assert!(matches.is_empty());

    let region = regions
        .create_region_with_address(
            tenant.id,
            Some("Bruxelas"),
            Some("Grand-Place 1"),
            point(BRUSSELS.0, BRUSSELS.1),
            future_date(2),
        )
        .await
        .unwrap();

    assert_eq!(region.name, "Bruxelas");
    assert_eq!(region.radius_km, 30.0);
    assert_eq!(region.max_deliveries_per_day, 13);

    let stored = store.region(tenant.id, region.id).await.unwrap().unwrap();
    assert!((stored.center_lat - BRUSSELS.0).abs() < 1e-9);
    assert!((stored.center_lng - BRUSSELS.1).abs() < 1e-9);

    // Agora o mesmo ponto casa com a região recém-criada.
    let matches = regions
        .match_regions(tenant.id, point(BRUSSELS.0, BRUSSELS.1), None)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].region.id, region.id);
    assert!(matches[0].distance_km < 1e-6);
}

// --- Centróide recalculado como média completa a cada anexação ---
#[tokio::test]
async fn attach_address_moves_centroid_to_the_mean() {
    let store = MemStore::new();
    let (regions, _, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;

    let region = regions
        .create_region_with_address(
            tenant.id,
            Some("Norte"),
            None,
            point(50.0, 4.0),
            future_date(1),
        )
        .await
        .unwrap();

    let center = regions
        .attach_address_to_region(tenant.id, region.id, None, point(52.0, 6.0), future_date(1))
        .await
        .unwrap();

    assert!((center.latitude - 51.0).abs() < 1e-9);
    assert!((center.longitude - 5.0).abs() < 1e-9);
}

// --- Cenário B: cota 2 por dia; a terceira tentativa falha nomeando a cota ---
#[tokio::test]
async fn third_delivery_over_region_quota_is_rejected() {
    let store = MemStore::new();
    let (_, scheduling, _, capacity) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, Some(2)).await;
    let date = future_date(5);

    let mut last_region = None;
    for _ in 0..2 {
        let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
        let mut request = ScheduleRequest::new(tenant.id, order.id, date);
        request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
        request.municipality = Some("Bruxelas".to_string());
        let scheduled = scheduling.schedule_delivery(request).await.unwrap();
        last_region = Some(scheduled.region_id);
    }

    let region_id = last_region.unwrap();
    assert_eq!(
        capacity
            .region_delivery_count(tenant.id, region_id, date)
            .await
            .unwrap(),
        2
    );

    // A terceira entrega cai na mesma região (ela é pulada por estar na
    // cota, mas criar outra região é proibido aqui para forçar o erro).
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.region_id = Some(region_id);
    let err = scheduling.schedule_delivery(request).await.unwrap_err();

    match &err {
        AppError::BusinessRule(RuleViolation::RegionQuotaExceeded { current, max, .. }) => {
            assert_eq!(*current, 2);
            assert_eq!(*max, 2);
        }
        other => panic!("esperava erro de cota, veio {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("Bruxelas"));
    assert!(message.contains(&date.to_string()));

    // O invariante da cota segue de pé depois da sequência toda.
    assert!(
        capacity
            .region_delivery_count(tenant.id, region_id, date)
            .await
            .unwrap()
            <= 2
    );
}

// --- Cenário C: orçamento de 480 minutos; 470 + 15 estoura, 470 + 10 fecha exato ---
#[tokio::test]
async fn time_budget_rejects_overflow_but_allows_exact_fit() {
    let store = MemStore::new();
    let mut defaults = SchedulingDefaults::default();
    defaults.slot_minutes.insert("bloco_grande".to_string(), 470);
    defaults.slot_minutes.insert("entrega_rapida".to_string(), 10);
    let (_, scheduling, _, _) = services(&store, defaults);
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(4);

    // 470 minutos já ocupados na rota.
    let order = seed_order(&store, tenant.id, "bloco_grande", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    let first = scheduling.schedule_delivery(request).await.unwrap();

    // Categoria desconhecida: 15 minutos padrão; 470 + 15 > 480.
    let order = seed_order(&store, tenant.id, "categoria_desconhecida", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.region_id = Some(first.region_id);
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    match &err {
        AppError::BusinessRule(RuleViolation::TimeBudgetExceeded {
            used,
            requested,
            budget,
            ..
        }) => {
            assert_eq!(*used, 470);
            assert_eq!(*requested, 15);
            assert_eq!(*budget, 480);
        }
        other => panic!("esperava erro de orçamento de minutos, veio {other:?}"),
    }

    // 470 + 10 = 480: no limite, não acima dele.
    let order = seed_order(&store, tenant.id, "entrega_rapida", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.region_id = Some(first.region_id);
    let second = scheduling.schedule_delivery(request).await.unwrap();
    assert_eq!(second.run_id, first.run_id);
}

// --- Limite de paradas da rota ---
#[tokio::test]
async fn stop_limit_caps_deliveries_per_run() {
    let store = MemStore::new();
    let mut defaults = SchedulingDefaults::default();
    defaults.run_capacity = 2;
    defaults.max_deliveries_per_day = 13;
    let (_, scheduling, _, _) = services(&store, defaults);
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(6);

    let mut first_region = None;
    for _ in 0..2 {
        let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
        let mut request = ScheduleRequest::new(tenant.id, order.id, date);
        request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
        let scheduled = scheduling.schedule_delivery(request).await.unwrap();
        first_region.get_or_insert(scheduled.region_id);
    }

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.region_id = first_region;
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BusinessRule(RuleViolation::StopLimitReached { max: 2, .. })
    ));
}

// --- Cenário D: locatário sem frota nenhuma; qualquer dia é válido ---
#[tokio::test]
async fn capacity_info_skips_rules_for_unconfigured_fleet() {
    let store = MemStore::new();
    let (_, _, _, capacity) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(3);

    let info = capacity.capacity_info(tenant.id, date).await.unwrap();
    assert!(info.is_valid);
    assert!(info.reason.is_none());
    assert_eq!(info.drivers_left, UNCONSTRAINED);
    assert_eq!(info.trucks_left, UNCONSTRAINED);

    // Idempotente: sem escritas no meio, o retrato não muda.
    let again = capacity.capacity_info(tenant.id, date).await.unwrap();
    assert_eq!(info, again);
}

// --- Motoristas configurados exigem disponibilidade na data exata ---
#[tokio::test]
async fn configured_driver_without_availability_blocks_the_date() {
    let store = MemStore::new();
    let (_, scheduling, _, capacity) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(5);

    let driver = store
        .insert_employee(NewEmployee {
            tenant_id: tenant.id,
            first_name: "Maria".to_string(),
            last_name: "Silva".to_string(),
            email: None,
            role: EmployeeRole::Driver,
        })
        .await
        .unwrap();

    let info = capacity.capacity_info(tenant.id, date).await.unwrap();
    assert!(!info.is_valid);
    assert_eq!(info.drivers_left, 0);

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BusinessRule(RuleViolation::NoDriverAvailable { .. })
    ));

    // Com a disponibilidade marcada, o agendamento passa e a rota herda
    // o motorista livre.
    store
        .set_availability(tenant.id, driver.id, date, true)
        .await
        .unwrap();
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    scheduling.schedule_delivery(request).await.unwrap();
}

// --- A regra de caminhões reserva um slot para uma região nova ---
#[tokio::test]
async fn single_truck_cannot_serve_a_second_region_on_the_same_date() {
    let store = MemStore::new();
    let (_, scheduling, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(8);

    store
        .insert_truck(NewTruck {
            tenant_id: tenant.id,
            name: "Único".to_string(),
        })
        .await
        .unwrap();

    // Primeira região do dia: 0 ativas + 1 <= 1 caminhão.
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    scheduling.schedule_delivery(request).await.unwrap();

    // Segunda região, longe da primeira: 1 ativa + 1 > 1 caminhão.
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(51.9, 5.9));
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BusinessRule(RuleViolation::TruckFleetExhausted {
            active: 1,
            trucks: 1,
            ..
        })
    ));
}

// --- Região mais próxima na cota: cai para a próxima candidata ---
#[tokio::test]
async fn nearest_region_at_quota_falls_through_to_next_candidate() {
    let store = MemStore::new();
    let (_, scheduling, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(5);

    // Duas regiões sobrepostas: a mais próxima com cota 1.
    let tx = store.begin().await.unwrap();
    let near = tx
        .insert_region(NewRegion {
            tenant_id: tenant.id,
            name: "Perto".to_string(),
            center: point(BRUSSELS.0, BRUSSELS.1),
            radius_km: 30.0,
            max_deliveries_per_day: 1,
        })
        .await
        .unwrap();
    let next = tx
        .insert_region(NewRegion {
            tenant_id: tenant.id,
            name: "Vizinha".to_string(),
            center: point(50.90, 4.40),
            radius_km: 30.0,
            max_deliveries_per_day: 13,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    let first = scheduling.schedule_delivery(request).await.unwrap();
    assert_eq!(first.region_id, near.id);

    // A mais próxima está na cota: a vizinha assume, sem criar região nova.
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    let second = scheduling.schedule_delivery(request).await.unwrap();
    assert_eq!(second.region_id, next.id);
}

// --- Sem candidatas e sem permissão de criar: violação de regra, não pânico ---
#[tokio::test]
async fn outside_all_regions_without_create_is_a_business_error() {
    let store = MemStore::new();
    let (_, scheduling, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, future_date(2));
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    request.create_region = false;
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BusinessRule(RuleViolation::OutsideDeliveryRegions)
    ));
    assert!(err.is_business_rule());
}

// --- Datas no passado são recusadas antes de qualquer escrita ---
#[tokio::test]
async fn past_dates_are_rejected() {
    let store = MemStore::new();
    let (_, scheduling, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, future_date(-1));
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    let err = scheduling.schedule_delivery(request).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::BusinessRule(RuleViolation::DateInPast(_))
    ));
}

// --- Seleção manual de região sem coordenadas: cota conta, centróide não se move ---
#[tokio::test]
async fn manual_region_scheduling_counts_quota_without_moving_centroid() {
    let store = MemStore::new();
    let (regions, scheduling, _, capacity) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(3);

    let region = regions
        .create_region_with_address(tenant.id, Some("Manual"), None, point(50.0, 4.0), date)
        .await
        .unwrap();

    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.region_id = Some(region.id);
    scheduling.schedule_delivery(request).await.unwrap();

    assert_eq!(
        capacity
            .region_delivery_count(tenant.id, region.id, date)
            .await
            .unwrap(),
        2
    );
    let stored = store.region(tenant.id, region.id).await.unwrap().unwrap();
    assert!((stored.center_lat - 50.0).abs() < 1e-9);
    assert!((stored.center_lng - 4.0).abs() < 1e-9);
}

// --- Cenário E: dia com carga na região vence dia anterior vazio ---
#[tokio::test]
async fn suggestions_rank_busy_day_before_earlier_empty_day() {
    let store = MemStore::new();
    let (_, scheduling, suggestions, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let start = future_date(1);
    let busy_day = start + Duration::days(2);

    // Uma entrega agendada no terceiro dia da janela.
    let order = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, busy_day);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    scheduling.schedule_delivery(request).await.unwrap();

    let ranked = suggestions
        .suggest_dates_from(tenant.id, point(50.853, 4.352), Some(7), start)
        .await
        .unwrap();

    // O dia 3 (com carga) vem antes do dia 1 (vazio) apesar de mais tarde.
    assert_eq!(ranked[0].date, busy_day);
    assert_eq!(ranked[0].deliveries_scheduled, 1);
    assert!(ranked[0].spots_left < 13);
    assert_eq!(ranked[1].date, start);

    // Uma entrada por data, janela inteira coberta.
    assert_eq!(ranked.len(), 7);
    let mut dates: Vec<_> = ranked.iter().map(|s| s.date).collect();
    dates.dedup();
    assert_eq!(dates.len(), 7);
}

// --- Sugestões por região conhecida (sem coordenadas) ---
#[tokio::test]
async fn suggestions_for_known_region_have_zero_distance() {
    let store = MemStore::new();
    let (regions, _, suggestions, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let start = future_date(1);

    let region = regions
        .create_region_with_address(tenant.id, Some("Manual"), None, point(50.0, 4.0), start)
        .await
        .unwrap();

    let ranked = suggestions
        .suggest_dates_for_region_from(tenant.id, region.id, Some(5), start)
        .await
        .unwrap();

    assert_eq!(ranked.len(), 5);
    assert!(ranked.iter().all(|s| s.distance_km == 0.0));
    assert!(ranked.iter().all(|s| s.region_id == region.id));
}

// --- Concorrência: duas requisições para a mesma região/data não duplicam a rota ---
#[tokio::test]
async fn concurrent_scheduling_shares_one_run() {
    let store = MemStore::new();
    let (_, scheduling, _, capacity) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(4);

    let order_a = seed_order(&store, tenant.id, "colchao_casal", 1).await;
    let order_b = seed_order(&store, tenant.id, "boxspring", 1).await;

    let mut request_a = ScheduleRequest::new(tenant.id, order_a.id, date);
    request_a.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    request_a.municipality = Some("Bruxelas".to_string());
    let mut request_b = ScheduleRequest::new(tenant.id, order_b.id, date);
    request_b.coordinates = Some(point(50.851, 4.351));
    request_b.municipality = Some("Bruxelas".to_string());

    let scheduling_a = scheduling.clone();
    let scheduling_b = scheduling.clone();
    let task_a = tokio::spawn(async move { scheduling_a.schedule_delivery(request_a).await });
    let task_b = tokio::spawn(async move { scheduling_b.schedule_delivery(request_b).await });

    let outcome_a = task_a.await.unwrap().unwrap();
    let outcome_b = task_b.await.unwrap().unwrap();

    // Uma só rota para a região/data; quem chegou depois anexou nela.
    assert_eq!(outcome_a.run_id, outcome_b.run_id);
    assert_eq!(outcome_a.region_id, outcome_b.region_id);
    assert_eq!(
        capacity
            .region_delivery_count(tenant.id, outcome_a.region_id, date)
            .await
            .unwrap(),
        2
    );
}

// --- Sugestões a partir de um endereço geocodificado ---
#[tokio::test]
async fn suggestions_from_address_go_through_the_geocoder() {
    use async_trait::async_trait;
    use entregas_core::services::geocoding::Geocoder;

    struct FixedGeocoder(Coordinates);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Coordinates, AppError> {
            Ok(self.0)
        }
    }

    struct BrokenGeocoder;

    #[async_trait]
    impl Geocoder for BrokenGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Coordinates, AppError> {
            Err(AppError::GeocodingError("serviço fora do ar".to_string()))
        }
    }

    let store = MemStore::new();
    let (regions, _, suggestions, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let start = future_date(1);

    let region = regions
        .create_region_with_address(
            tenant.id,
            Some("Bruxelas"),
            None,
            point(BRUSSELS.0, BRUSSELS.1),
            start,
        )
        .await
        .unwrap();

    let geocoder = FixedGeocoder(point(50.853, 4.352));
    let ranked = suggestions
        .suggest_for_address(&geocoder, tenant.id, "Grand-Place 1, Bruxelas", Some(3))
        .await
        .unwrap();
    assert!(!ranked.is_empty());
    assert!(ranked.iter().all(|s| s.region_id == region.id));

    // A falha do geocodificador sobe como erro de serviço, não como
    // violação de regra: a seleção manual de região é o plano B.
    let err = suggestions
        .suggest_for_address(&BrokenGeocoder, tenant.id, "qualquer", Some(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GeocodingError(_)));
    assert!(!err.is_business_rule());
}

// --- Listagem de entregas com filtros ---
#[tokio::test]
async fn delivery_overview_filters_by_region_and_date() {
    let store = MemStore::new();
    let (_, scheduling, _, _) = services(&store, SchedulingDefaults::default());
    let tenant = seed_tenant(&store, None).await;
    let date = future_date(2);

    let order = seed_order(&store, tenant.id, "boxspring", 1).await;
    let mut request = ScheduleRequest::new(tenant.id, order.id, date);
    request.coordinates = Some(point(BRUSSELS.0, BRUSSELS.1));
    request.municipality = Some("Bruxelas".to_string());
    let scheduled = scheduling.schedule_delivery(request).await.unwrap();

    let all = scheduling
        .delivery_overview(tenant.id, None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].region_name.as_deref(), Some("Bruxelas"));
    assert_eq!(all[0].scheduled_date, Some(date));

    let filtered = scheduling
        .delivery_overview(tenant.id, Some(scheduled.region_id), Some(date))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);

    let none = scheduling
        .delivery_overview(tenant.id, Some(Uuid::new_v4()), None)
        .await
        .unwrap();
    assert!(none.is_empty());
}
