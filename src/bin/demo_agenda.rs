// src/bin/demo_agenda.rs
//
// Demonstração de ponta a ponta sobre o store em memória: cadastra um
// locatário com frota e produtos, agenda algumas entregas e imprime as
// sugestões de datas para um endereço novo.

use chrono::{Duration, Utc};
use entregas_core::common::geo::Coordinates;
use entregas_core::db::{MemStore, Store};
use entregas_core::models::fleet::{EmployeeRole, NewEmployee, NewTruck};
use entregas_core::models::orders::{NewOrder, NewOrderItem};
use entregas_core::models::tenancy::NewTenant;
use entregas_core::services::capacity_service::CapacityService;
use entregas_core::services::scheduling_service::{ScheduleRequest, SchedulingService};
use entregas_core::services::suggestion_service::SuggestionService;
use entregas_core::SchedulingDefaults;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let store = MemStore::new();
    let defaults = SchedulingDefaults::default();
    let scheduling = SchedulingService::new(store.clone(), defaults.clone());
    let suggestions = SuggestionService::new(store.clone(), defaults.clone());
    let capacity = CapacityService::new(store.clone());

    // --- Cadastro do locatário e da frota ---
    let tenant = store
        .insert_tenant(NewTenant {
            name: "Sleep Inn Colchões".to_string(),
            industry: None,
            contact_email: Some("contato@sleepinn.example".to_string()),
            default_radius_km: None,
            default_max_deliveries: None,
        })
        .await?;

    let driver = store
        .insert_employee(NewEmployee {
            tenant_id: tenant.id,
            first_name: "João".to_string(),
            last_name: "Motorista".to_string(),
            email: None,
            role: EmployeeRole::Driver,
        })
        .await?;

    // Dois caminhões: a regra de frota reserva um slot para uma possível
    // região nova no dia, então um caminhão só não atende nem uma região.
    for name in ["Caminhão 01", "Caminhão 02"] {
        store
            .insert_truck(NewTruck {
                tenant_id: tenant.id,
                name: name.to_string(),
            })
            .await?;
    }

    let today = Utc::now().date_naive();
    let delivery_date = today + Duration::days(3);
    store
        .set_availability(tenant.id, driver.id, delivery_date, true)
        .await?;

    // --- Pedidos ---
    let boxspring = store
        .ensure_product(tenant.id, "Boxspring Rainha", Some("boxspring"))
        .await?;
    let mattress = store
        .ensure_product(tenant.id, "Colchão Casal Conforto", Some("colchao_casal"))
        .await?;

    let mut scheduled = Vec::new();
    for (lat, lng) in [(50.8503, 4.3517), (50.8610, 4.3590), (50.8450, 4.3400)] {
        let order = store
            .insert_order(NewOrder {
                tenant_id: tenant.id,
                customer_id: None,
                seller_id: None,
                order_date: today,
                items: vec![
                    NewOrderItem {
                        product_id: boxspring.id,
                        quantity: 1,
                    },
                    NewOrderItem {
                        product_id: mattress.id,
                        quantity: 1,
                    },
                ],
            })
            .await?;

        let mut request = ScheduleRequest::new(tenant.id, order.id, delivery_date);
        request.coordinates = Some(Coordinates::new(lat, lng));
        request.municipality = Some("Bruxelas".to_string());

        let outcome = scheduling.schedule_delivery(request).await?;
        scheduled.push(outcome);
    }

    tracing::info!("✅ {} entregas agendadas para {}", scheduled.len(), delivery_date);

    // --- Capacidade do dia ---
    let info = capacity.capacity_info(tenant.id, delivery_date).await?;
    println!("capacidade: {}", serde_json::to_string_pretty(&info)?);

    // --- Sugestões para um endereço vizinho ---
    let ranked = suggestions
        .suggest_dates(tenant.id, Coordinates::new(50.8550, 4.3600), Some(7))
        .await?;
    println!("sugestões: {}", serde_json::to_string_pretty(&ranked)?);

    Ok(())
}
