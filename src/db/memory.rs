// src/db/memory.rs
//
// Store em memória para testes e demonstrações. As transações clonam o
// estado ao abrir, mutam a cópia e só a publicam no commit; o mutex
// único serializa escritores, cumprindo a mesma garantia que a trava de
// linha do Postgres dá por (locatário, região, data).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::geo::Coordinates;
use crate::db::{Store, StoreRead, StoreTx};
use crate::models::fleet::{Availability, Employee, EmployeeRole, NewEmployee, NewTruck, Truck};
use crate::models::orders::{CustomerOrder, NewOrder, OrderItem, OrderLine, OrderStatus, Product};
use crate::models::regions::{NewRegion, NewRegionAddress, Region, RegionAddress};
use crate::models::runs::{
    Delivery, DeliveryOverviewRow, DeliveryRun, DeliveryStatus, NewDelivery, NewRun, RunStatus,
};
use crate::models::tenancy::{NewTenant, Tenant};

#[derive(Debug, Default, Clone)]
struct MemState {
    tenants: Vec<Tenant>,
    regions: Vec<Region>,
    region_addresses: Vec<RegionAddress>,
    employees: Vec<Employee>,
    availabilities: Vec<Availability>,
    trucks: Vec<Truck>,
    products: Vec<Product>,
    orders: Vec<CustomerOrder>,
    order_items: Vec<OrderItem>,
    runs: Vec<DeliveryRun>,
    deliveries: Vec<Delivery>,
}

impl MemState {
    fn tenant(&self, tenant_id: Uuid) -> Option<Tenant> {
        self.tenants.iter().find(|t| t.id == tenant_id).cloned()
    }

    fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Option<Region> {
        self.regions
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.id == region_id)
            .cloned()
    }

    fn regions(&self, tenant_id: Uuid) -> Vec<Region> {
        let mut regions: Vec<Region> = self
            .regions
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect();
        regions.sort_by(|a, b| a.name.cmp(&b.name));
        regions
    }

    fn region_addresses(&self, tenant_id: Uuid, region_id: Uuid) -> Vec<RegionAddress> {
        self.region_addresses
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.region_id == region_id)
            .cloned()
            .collect()
    }

    fn region_delivery_count(&self, tenant_id: Uuid, region_id: Uuid, date: NaiveDate) -> i64 {
        self.region_addresses
            .iter()
            .filter(|a| {
                a.tenant_id == tenant_id && a.region_id == region_id && a.scheduled_date == date
            })
            .count() as i64
    }

    fn count_drivers(&self, tenant_id: Uuid) -> i64 {
        self.employees
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.role == EmployeeRole::Driver && e.active)
            .count() as i64
    }

    fn available_driver_ids(&self, tenant_id: Uuid, date: NaiveDate) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .employees
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.role == EmployeeRole::Driver && e.active)
            .filter(|e| {
                self.availabilities.iter().any(|a| {
                    a.tenant_id == tenant_id
                        && a.employee_id == e.id
                        && a.available_date == date
                        && a.active
                })
            })
            .map(|e| e.id)
            .collect();
        ids.sort();
        ids
    }

    fn count_trucks(&self, tenant_id: Uuid) -> i64 {
        self.trucks
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.active)
            .count() as i64
    }

    fn count_active_regions(&self, tenant_id: Uuid, date: NaiveDate) -> i64 {
        self.runs
            .iter()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.scheduled_date == date
                    && r.status != RunStatus::Cancelled
            })
            .map(|r| r.region_id)
            .collect::<HashSet<_>>()
            .len() as i64
    }

    fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> i64 {
        self.deliveries
            .iter()
            .filter(|d| {
                d.tenant_id == tenant_id
                    && d.delivery_status != DeliveryStatus::Cancelled
                    && self
                        .runs
                        .iter()
                        .any(|r| r.id == d.run_id && r.scheduled_date == date)
            })
            .count() as i64
    }

    fn order(&self, tenant_id: Uuid, order_id: Uuid) -> Option<CustomerOrder> {
        self.orders
            .iter()
            .find(|o| o.tenant_id == tenant_id && o.id == order_id)
            .cloned()
    }

    fn order_lines(&self, tenant_id: Uuid, order_id: Uuid) -> Vec<OrderLine> {
        self.order_items
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.order_id == order_id)
            .filter_map(|item| {
                self.products
                    .iter()
                    .find(|p| p.tenant_id == tenant_id && p.id == item.product_id)
                    .map(|product| OrderLine {
                        product_name: product.name.clone(),
                        category: product.category.clone(),
                        quantity: item.quantity,
                    })
            })
            .collect()
    }

    fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Vec<OrderLine> {
        self.deliveries
            .iter()
            .filter(|d| {
                d.tenant_id == tenant_id
                    && d.run_id == run_id
                    && d.delivery_status != DeliveryStatus::Cancelled
            })
            .flat_map(|d| self.order_lines(tenant_id, d.order_id))
            .collect()
    }

    fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> i64 {
        self.deliveries
            .iter()
            .filter(|d| {
                d.tenant_id == tenant_id
                    && d.run_id == run_id
                    && d.delivery_status != DeliveryStatus::Cancelled
            })
            .count() as i64
    }

    fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Vec<DeliveryOverviewRow> {
        let mut rows: Vec<DeliveryOverviewRow> = self
            .deliveries
            .iter()
            .filter(|d| d.tenant_id == tenant_id)
            .filter_map(|d| {
                let run = self.runs.iter().find(|r| r.id == d.run_id);
                if let Some(wanted) = region_id {
                    if run.map(|r| r.region_id) != Some(wanted) {
                        return None;
                    }
                }
                if let Some(wanted) = date {
                    if run.map(|r| r.scheduled_date) != Some(wanted) {
                        return None;
                    }
                }
                let region = run
                    .and_then(|r| self.regions.iter().find(|rg| rg.id == r.region_id));
                let order = self.orders.iter().find(|o| o.id == d.order_id);
                Some(DeliveryOverviewRow {
                    delivery_id: d.id,
                    order_id: d.order_id,
                    delivery_status: d.delivery_status,
                    region_id: run.map(|r| r.region_id),
                    region_name: region.map(|rg| rg.name.clone()),
                    scheduled_date: run.map(|r| r.scheduled_date),
                    order_date: order.map(|o| o.order_date),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
        rows
    }
}

#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Transação do store em memória: segura o mutex do estado inteiro até
/// o commit/rollback, então só um escritor por vez.
pub struct MemTx {
    guard: OwnedMutexGuard<MemState>,
    working: Mutex<MemState>,
}

#[async_trait]
impl StoreRead for MemStore {
    async fn tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(self.state.lock().await.tenant(tenant_id))
    }

    async fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Result<Option<Region>, AppError> {
        Ok(self.state.lock().await.region(tenant_id, region_id))
    }

    async fn regions(&self, tenant_id: Uuid) -> Result<Vec<Region>, AppError> {
        Ok(self.state.lock().await.regions(tenant_id))
    }

    async fn region_addresses(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
    ) -> Result<Vec<RegionAddress>, AppError> {
        Ok(self.state.lock().await.region_addresses(tenant_id, region_id))
    }

    async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self
            .state
            .lock()
            .await
            .region_delivery_count(tenant_id, region_id, date))
    }

    async fn count_drivers(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(self.state.lock().await.count_drivers(tenant_id))
    }

    async fn count_available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self.state.lock().await.available_driver_ids(tenant_id, date).len() as i64)
    }

    async fn available_driver_ids(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, AppError> {
        Ok(self.state.lock().await.available_driver_ids(tenant_id, date))
    }

    async fn count_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(self.state.lock().await.count_trucks(tenant_id))
    }

    async fn count_active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self.state.lock().await.count_active_regions(tenant_id, date))
    }

    async fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> Result<i64, AppError> {
        Ok(self.state.lock().await.count_deliveries(tenant_id, date))
    }

    async fn order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<CustomerOrder>, AppError> {
        Ok(self.state.lock().await.order(tenant_id, order_id))
    }

    async fn order_lines(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderLine>, AppError> {
        Ok(self.state.lock().await.order_lines(tenant_id, order_id))
    }

    async fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Vec<OrderLine>, AppError> {
        Ok(self.state.lock().await.run_lines(tenant_id, run_id))
    }

    async fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> Result<i64, AppError> {
        Ok(self.state.lock().await.count_run_deliveries(tenant_id, run_id))
    }

    async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError> {
        Ok(self
            .state
            .lock()
            .await
            .delivery_overview(tenant_id, region_id, date))
    }
}

#[async_trait]
impl StoreRead for MemTx {
    async fn tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(self.working.lock().await.tenant(tenant_id))
    }

    async fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Result<Option<Region>, AppError> {
        Ok(self.working.lock().await.region(tenant_id, region_id))
    }

    async fn regions(&self, tenant_id: Uuid) -> Result<Vec<Region>, AppError> {
        Ok(self.working.lock().await.regions(tenant_id))
    }

    async fn region_addresses(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
    ) -> Result<Vec<RegionAddress>, AppError> {
        Ok(self
            .working
            .lock()
            .await
            .region_addresses(tenant_id, region_id))
    }

    async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self
            .working
            .lock()
            .await
            .region_delivery_count(tenant_id, region_id, date))
    }

    async fn count_drivers(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(self.working.lock().await.count_drivers(tenant_id))
    }

    async fn count_available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self
            .working
            .lock()
            .await
            .available_driver_ids(tenant_id, date)
            .len() as i64)
    }

    async fn available_driver_ids(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, AppError> {
        Ok(self.working.lock().await.available_driver_ids(tenant_id, date))
    }

    async fn count_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(self.working.lock().await.count_trucks(tenant_id))
    }

    async fn count_active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(self.working.lock().await.count_active_regions(tenant_id, date))
    }

    async fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> Result<i64, AppError> {
        Ok(self.working.lock().await.count_deliveries(tenant_id, date))
    }

    async fn order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<CustomerOrder>, AppError> {
        Ok(self.working.lock().await.order(tenant_id, order_id))
    }

    async fn order_lines(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderLine>, AppError> {
        Ok(self.working.lock().await.order_lines(tenant_id, order_id))
    }

    async fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Vec<OrderLine>, AppError> {
        Ok(self.working.lock().await.run_lines(tenant_id, run_id))
    }

    async fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .working
            .lock()
            .await
            .count_run_deliveries(tenant_id, run_id))
    }

    async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError> {
        Ok(self
            .working
            .lock()
            .await
            .delivery_overview(tenant_id, region_id, date))
    }
}

#[async_trait]
impl StoreTx for MemTx {
    async fn lock_run(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DeliveryRun>, AppError> {
        // A trava global já foi adquirida no begin(); aqui é só a busca.
        Ok(self
            .working
            .lock()
            .await
            .runs
            .iter()
            .find(|r| {
                r.tenant_id == tenant_id
                    && r.region_id == region_id
                    && r.scheduled_date == date
                    && !r.status.is_terminal()
            })
            .cloned())
    }

    async fn insert_run(&self, run: NewRun) -> Result<DeliveryRun, AppError> {
        let mut state = self.working.lock().await;
        let run = DeliveryRun {
            id: Uuid::new_v4(),
            tenant_id: run.tenant_id,
            scheduled_date: run.scheduled_date,
            region_id: run.region_id,
            driver_id: run.driver_id,
            truck_id: run.truck_id,
            capacity: run.capacity,
            status: run.status,
        };
        state.runs.push(run.clone());
        Ok(run)
    }

    async fn insert_region(&self, region: NewRegion) -> Result<Region, AppError> {
        let mut state = self.working.lock().await;
        let region = Region {
            id: Uuid::new_v4(),
            tenant_id: region.tenant_id,
            name: region.name,
            center_lat: region.center.latitude,
            center_lng: region.center.longitude,
            radius_km: region.radius_km,
            max_deliveries_per_day: region.max_deliveries_per_day,
        };
        state.regions.push(region.clone());
        Ok(region)
    }

    async fn insert_region_address(
        &self,
        address: NewRegionAddress,
    ) -> Result<RegionAddress, AppError> {
        let mut state = self.working.lock().await;
        let address = RegionAddress {
            id: Uuid::new_v4(),
            tenant_id: address.tenant_id,
            region_id: address.region_id,
            scheduled_date: address.scheduled_date,
            address_text: address.address_text,
            latitude: address.coordinates.latitude,
            longitude: address.coordinates.longitude,
        };
        state.region_addresses.push(address.clone());
        Ok(address)
    }

    async fn update_region_center(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        center: Coordinates,
    ) -> Result<(), AppError> {
        let mut state = self.working.lock().await;
        if let Some(region) = state
            .regions
            .iter_mut()
            .find(|r| r.tenant_id == tenant_id && r.id == region_id)
        {
            region.center_lat = center.latitude;
            region.center_lng = center.longitude;
        }
        Ok(())
    }

    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<Delivery, AppError> {
        let mut state = self.working.lock().await;
        let delivery = Delivery {
            id: Uuid::new_v4(),
            tenant_id: delivery.tenant_id,
            order_id: delivery.order_id,
            run_id: delivery.run_id,
            delivery_status: DeliveryStatus::Scheduled,
            delivered_at: None,
        };
        state.deliveries.push(delivery.clone());
        Ok(delivery)
    }

    async fn commit(self) -> Result<(), AppError> {
        let mut guard = self.guard;
        *guard = self.working.into_inner();
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        // Descarta a cópia de trabalho; o estado publicado fica intacto.
        Ok(())
    }
}

#[async_trait]
impl Store for MemStore {
    type Tx = MemTx;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = Mutex::new(guard.clone());
        Ok(MemTx { guard, working })
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, AppError> {
        let mut state = self.state.lock().await;
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: tenant.name,
            industry: tenant.industry.unwrap_or_else(|| "retail".to_string()),
            contact_email: tenant.contact_email,
            default_radius_km: tenant.default_radius_km,
            default_max_deliveries: tenant.default_max_deliveries,
            created_at: chrono::Utc::now(),
        };
        state.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let mut state = self.state.lock().await;
        let employee = Employee {
            id: Uuid::new_v4(),
            tenant_id: employee.tenant_id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            role: employee.role,
            active: true,
        };
        state.employees.push(employee.clone());
        Ok(employee)
    }

    async fn set_availability(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        active: bool,
    ) -> Result<Availability, AppError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.availabilities.iter_mut().find(|a| {
            a.tenant_id == tenant_id && a.employee_id == employee_id && a.available_date == date
        }) {
            existing.active = active;
            return Ok(existing.clone());
        }
        let availability = Availability {
            id: Uuid::new_v4(),
            tenant_id,
            employee_id,
            available_date: date,
            active,
        };
        state.availabilities.push(availability.clone());
        Ok(availability)
    }

    async fn insert_truck(&self, truck: NewTruck) -> Result<Truck, AppError> {
        let mut state = self.state.lock().await;
        let truck = Truck {
            id: Uuid::new_v4(),
            tenant_id: truck.tenant_id,
            name: truck.name,
            active: true,
        };
        state.trucks.push(truck.clone());
        Ok(truck)
    }

    async fn ensure_product(
        &self,
        tenant_id: Uuid,
        name: &str,
        category: Option<&str>,
    ) -> Result<Product, AppError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .products
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.name == name)
        {
            return Ok(existing.clone());
        }
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            category: Some(category.unwrap_or("custom").to_string()),
            stock_qty: 9999,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<CustomerOrder, AppError> {
        let mut state = self.state.lock().await;
        let created = CustomerOrder {
            id: Uuid::new_v4(),
            tenant_id: order.tenant_id,
            customer_id: order.customer_id,
            seller_id: order.seller_id,
            order_date: order.order_date,
            status: OrderStatus::New,
        };
        state.orders.push(created.clone());
        for item in &order.items {
            state.order_items.push(OrderItem {
                id: Uuid::new_v4(),
                tenant_id: order.tenant_id,
                order_id: created.id,
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
        Ok(created)
    }
}
