// src/db/postgres.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::geo::Coordinates;
use crate::db::{Store, StoreRead, StoreTx};
use crate::models::fleet::{Availability, Employee, NewEmployee, NewTruck, Truck};
use crate::models::orders::{CustomerOrder, NewOrder, OrderLine, OrderStatus, Product};
use crate::models::regions::{NewRegion, NewRegionAddress, Region, RegionAddress};
use crate::models::runs::{Delivery, DeliveryOverviewRow, DeliveryRun, NewDelivery, NewRun};
use crate::models::tenancy::{NewTenant, Tenant};

/// Roda as migrações embutidas (diretório `migrations/`).
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

// O store de produção sobre Postgres. Clonar é barato: só a pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Uma transação aberta. O `Mutex` existe só para dar `&self` nas
/// leituras do seam; a transação em si é usada por um único fluxo.
pub struct PgTx {
    tx: Mutex<Transaction<'static, Postgres>>,
}

// =========================================================================
//  CONSULTAS (genéricas sobre Executor: servem a pool e a transação)
// =========================================================================

async fn q_tenant<'e, E>(ex: E, tenant_id: Uuid) -> Result<Option<Tenant>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Tenant>("SELECT * FROM tenant WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(ex)
        .await
}

async fn q_region<'e, E>(
    ex: E,
    tenant_id: Uuid,
    region_id: Uuid,
) -> Result<Option<Region>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Region>("SELECT * FROM region WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(region_id)
        .fetch_optional(ex)
        .await
}

async fn q_regions<'e, E>(ex: E, tenant_id: Uuid) -> Result<Vec<Region>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, Region>("SELECT * FROM region WHERE tenant_id = $1 ORDER BY name")
        .bind(tenant_id)
        .fetch_all(ex)
        .await
}

async fn q_region_addresses<'e, E>(
    ex: E,
    tenant_id: Uuid,
    region_id: Uuid,
) -> Result<Vec<RegionAddress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, RegionAddress>(
        "SELECT * FROM region_address WHERE tenant_id = $1 AND region_id = $2",
    )
    .bind(tenant_id)
    .bind(region_id)
    .fetch_all(ex)
    .await
}

async fn q_region_delivery_count<'e, E>(
    ex: E,
    tenant_id: Uuid,
    region_id: Uuid,
    date: NaiveDate,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM region_address
        WHERE tenant_id = $1 AND region_id = $2 AND scheduled_date = $3
        "#,
    )
    .bind(tenant_id)
    .bind(region_id)
    .bind(date)
    .fetch_one(ex)
    .await
}

async fn q_count_drivers<'e, E>(ex: E, tenant_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employee WHERE tenant_id = $1 AND role = 'driver' AND active",
    )
    .bind(tenant_id)
    .fetch_one(ex)
    .await
}

async fn q_count_available_drivers<'e, E>(
    ex: E,
    tenant_id: Uuid,
    date: NaiveDate,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM employee e
        JOIN availability a
          ON a.tenant_id = e.tenant_id AND a.employee_id = e.id
        WHERE e.tenant_id = $1
          AND e.role = 'driver'
          AND e.active
          AND a.available_date = $2
          AND a.active
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_one(ex)
    .await
}

async fn q_available_driver_ids<'e, E>(
    ex: E,
    tenant_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT e.id
        FROM employee e
        JOIN availability a
          ON a.tenant_id = e.tenant_id AND a.employee_id = e.id
        WHERE e.tenant_id = $1
          AND e.role = 'driver'
          AND e.active
          AND a.available_date = $2
          AND a.active
        ORDER BY e.id
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_all(ex)
    .await
}

async fn q_count_trucks<'e, E>(ex: E, tenant_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM truck WHERE tenant_id = $1 AND active")
        .bind(tenant_id)
        .fetch_one(ex)
        .await
}

async fn q_count_active_regions<'e, E>(
    ex: E,
    tenant_id: Uuid,
    date: NaiveDate,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(DISTINCT region_id) FROM delivery_run
        WHERE tenant_id = $1 AND scheduled_date = $2 AND status <> 'cancelled'
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_one(ex)
    .await
}

async fn q_count_deliveries<'e, E>(
    ex: E,
    tenant_id: Uuid,
    date: NaiveDate,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM delivery d
        JOIN delivery_run r ON r.id = d.run_id
        WHERE d.tenant_id = $1
          AND r.scheduled_date = $2
          AND d.delivery_status <> 'cancelled'
        "#,
    )
    .bind(tenant_id)
    .bind(date)
    .fetch_one(ex)
    .await
}

async fn q_order<'e, E>(
    ex: E,
    tenant_id: Uuid,
    order_id: Uuid,
) -> Result<Option<CustomerOrder>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, CustomerOrder>(
        "SELECT * FROM customer_order WHERE tenant_id = $1 AND id = $2",
    )
    .bind(tenant_id)
    .bind(order_id)
    .fetch_optional(ex)
    .await
}

async fn q_order_lines<'e, E>(
    ex: E,
    tenant_id: Uuid,
    order_id: Uuid,
) -> Result<Vec<OrderLine>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT p.name AS product_name, p.category, oi.quantity
        FROM order_item oi
        JOIN product p ON p.tenant_id = oi.tenant_id AND p.id = oi.product_id
        WHERE oi.tenant_id = $1 AND oi.order_id = $2
        "#,
    )
    .bind(tenant_id)
    .bind(order_id)
    .fetch_all(ex)
    .await
}

async fn q_run_lines<'e, E>(
    ex: E,
    tenant_id: Uuid,
    run_id: Uuid,
) -> Result<Vec<OrderLine>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, OrderLine>(
        r#"
        SELECT p.name AS product_name, p.category, oi.quantity
        FROM delivery d
        JOIN order_item oi ON oi.tenant_id = d.tenant_id AND oi.order_id = d.order_id
        JOIN product p ON p.tenant_id = oi.tenant_id AND p.id = oi.product_id
        WHERE d.tenant_id = $1 AND d.run_id = $2 AND d.delivery_status <> 'cancelled'
        "#,
    )
    .bind(tenant_id)
    .bind(run_id)
    .fetch_all(ex)
    .await
}

async fn q_count_run_deliveries<'e, E>(
    ex: E,
    tenant_id: Uuid,
    run_id: Uuid,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM delivery
        WHERE tenant_id = $1 AND run_id = $2 AND delivery_status <> 'cancelled'
        "#,
    )
    .bind(tenant_id)
    .bind(run_id)
    .fetch_one(ex)
    .await
}

async fn q_delivery_overview<'e, E>(
    ex: E,
    tenant_id: Uuid,
    region_id: Option<Uuid>,
    date: Option<NaiveDate>,
) -> Result<Vec<DeliveryOverviewRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DeliveryOverviewRow>(
        r#"
        SELECT
            d.id AS delivery_id,
            d.order_id,
            d.delivery_status,
            r.region_id,
            rg.name AS region_name,
            r.scheduled_date,
            co.order_date
        FROM delivery d
        LEFT JOIN delivery_run r ON r.id = d.run_id
        LEFT JOIN region rg ON rg.id = r.region_id
        LEFT JOIN customer_order co ON co.id = d.order_id
        WHERE d.tenant_id = $1
          AND ($2::uuid IS NULL OR r.region_id = $2)
          AND ($3::date IS NULL OR r.scheduled_date = $3)
        ORDER BY r.scheduled_date DESC NULLS LAST
        "#,
    )
    .bind(tenant_id)
    .bind(region_id)
    .bind(date)
    .fetch_all(ex)
    .await
}

// =========================================================================
//  StoreRead: pela pool (sem trava) e por dentro da transação
// =========================================================================

#[async_trait]
impl StoreRead for PgStore {
    async fn tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(q_tenant(&self.pool, tenant_id).await?)
    }

    async fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Result<Option<Region>, AppError> {
        Ok(q_region(&self.pool, tenant_id, region_id).await?)
    }

    async fn regions(&self, tenant_id: Uuid) -> Result<Vec<Region>, AppError> {
        Ok(q_regions(&self.pool, tenant_id).await?)
    }

    async fn region_addresses(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
    ) -> Result<Vec<RegionAddress>, AppError> {
        Ok(q_region_addresses(&self.pool, tenant_id, region_id).await?)
    }

    async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(q_region_delivery_count(&self.pool, tenant_id, region_id, date).await?)
    }

    async fn count_drivers(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(q_count_drivers(&self.pool, tenant_id).await?)
    }

    async fn count_available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(q_count_available_drivers(&self.pool, tenant_id, date).await?)
    }

    async fn available_driver_ids(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, AppError> {
        Ok(q_available_driver_ids(&self.pool, tenant_id, date).await?)
    }

    async fn count_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        Ok(q_count_trucks(&self.pool, tenant_id).await?)
    }

    async fn count_active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        Ok(q_count_active_regions(&self.pool, tenant_id, date).await?)
    }

    async fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> Result<i64, AppError> {
        Ok(q_count_deliveries(&self.pool, tenant_id, date).await?)
    }

    async fn order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<CustomerOrder>, AppError> {
        Ok(q_order(&self.pool, tenant_id, order_id).await?)
    }

    async fn order_lines(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderLine>, AppError> {
        Ok(q_order_lines(&self.pool, tenant_id, order_id).await?)
    }

    async fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Vec<OrderLine>, AppError> {
        Ok(q_run_lines(&self.pool, tenant_id, run_id).await?)
    }

    async fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> Result<i64, AppError> {
        Ok(q_count_run_deliveries(&self.pool, tenant_id, run_id).await?)
    }

    async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError> {
        Ok(q_delivery_overview(&self.pool, tenant_id, region_id, date).await?)
    }
}

#[async_trait]
impl StoreRead for PgTx {
    async fn tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_tenant(&mut **tx, tenant_id).await?)
    }

    async fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Result<Option<Region>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_region(&mut **tx, tenant_id, region_id).await?)
    }

    async fn regions(&self, tenant_id: Uuid) -> Result<Vec<Region>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_regions(&mut **tx, tenant_id).await?)
    }

    async fn region_addresses(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
    ) -> Result<Vec<RegionAddress>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_region_addresses(&mut **tx, tenant_id, region_id).await?)
    }

    async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_region_delivery_count(&mut **tx, tenant_id, region_id, date).await?)
    }

    async fn count_drivers(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_drivers(&mut **tx, tenant_id).await?)
    }

    async fn count_available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_available_drivers(&mut **tx, tenant_id, date).await?)
    }

    async fn available_driver_ids(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_available_driver_ids(&mut **tx, tenant_id, date).await?)
    }

    async fn count_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_trucks(&mut **tx, tenant_id).await?)
    }

    async fn count_active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_active_regions(&mut **tx, tenant_id, date).await?)
    }

    async fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_deliveries(&mut **tx, tenant_id, date).await?)
    }

    async fn order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<CustomerOrder>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_order(&mut **tx, tenant_id, order_id).await?)
    }

    async fn order_lines(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderLine>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_order_lines(&mut **tx, tenant_id, order_id).await?)
    }

    async fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Vec<OrderLine>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_run_lines(&mut **tx, tenant_id, run_id).await?)
    }

    async fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> Result<i64, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_count_run_deliveries(&mut **tx, tenant_id, run_id).await?)
    }

    async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError> {
        let mut tx = self.tx.lock().await;
        Ok(q_delivery_overview(&mut **tx, tenant_id, region_id, date).await?)
    }
}

// =========================================================================
//  StoreTx: o caminho mutante, sob a trava de linha
// =========================================================================

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_run(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DeliveryRun>, AppError> {
        let mut tx = self.tx.lock().await;
        // FOR UPDATE: duas requisições para a mesma região/data são
        // serializadas aqui; a segunda só enxerga o estado já commitado.
        let run = sqlx::query_as::<_, DeliveryRun>(
            r#"
            SELECT * FROM delivery_run
            WHERE tenant_id = $1
              AND region_id = $2
              AND scheduled_date = $3
              AND status NOT IN ('completed', 'cancelled')
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(region_id)
        .bind(date)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(run)
    }

    async fn insert_run(&self, run: NewRun) -> Result<DeliveryRun, AppError> {
        let mut tx = self.tx.lock().await;
        let run = sqlx::query_as::<_, DeliveryRun>(
            r#"
            INSERT INTO delivery_run (
                tenant_id, scheduled_date, region_id, driver_id, truck_id, capacity, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(run.tenant_id)
        .bind(run.scheduled_date)
        .bind(run.region_id)
        .bind(run.driver_id)
        .bind(run.truck_id)
        .bind(run.capacity)
        .bind(run.status)
        .fetch_one(&mut **tx)
        .await?;
        Ok(run)
    }

    async fn insert_region(&self, region: NewRegion) -> Result<Region, AppError> {
        let mut tx = self.tx.lock().await;
        let region = sqlx::query_as::<_, Region>(
            r#"
            INSERT INTO region (
                tenant_id, name, center_lat, center_lng, radius_km, max_deliveries_per_day
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(region.tenant_id)
        .bind(region.name)
        .bind(region.center.latitude)
        .bind(region.center.longitude)
        .bind(region.radius_km)
        .bind(region.max_deliveries_per_day)
        .fetch_one(&mut **tx)
        .await?;
        Ok(region)
    }

    async fn insert_region_address(
        &self,
        address: NewRegionAddress,
    ) -> Result<RegionAddress, AppError> {
        let mut tx = self.tx.lock().await;
        let address = sqlx::query_as::<_, RegionAddress>(
            r#"
            INSERT INTO region_address (
                tenant_id, region_id, scheduled_date, address_text, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(address.tenant_id)
        .bind(address.region_id)
        .bind(address.scheduled_date)
        .bind(address.address_text)
        .bind(address.coordinates.latitude)
        .bind(address.coordinates.longitude)
        .fetch_one(&mut **tx)
        .await?;
        Ok(address)
    }

    async fn update_region_center(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        center: Coordinates,
    ) -> Result<(), AppError> {
        let mut tx = self.tx.lock().await;
        sqlx::query(
            "UPDATE region SET center_lat = $1, center_lng = $2 WHERE tenant_id = $3 AND id = $4",
        )
        .bind(center.latitude)
        .bind(center.longitude)
        .bind(tenant_id)
        .bind(region_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<Delivery, AppError> {
        let mut tx = self.tx.lock().await;
        let delivery = sqlx::query_as::<_, Delivery>(
            r#"
            INSERT INTO delivery (tenant_id, order_id, run_id, delivery_status)
            VALUES ($1, $2, $3, 'scheduled')
            RETURNING *
            "#,
        )
        .bind(delivery.tenant_id)
        .bind(delivery.order_id)
        .bind(delivery.run_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(delivery)
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }
}

// =========================================================================
//  Store: transações e cadastros simples
// =========================================================================

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<Self::Tx, AppError> {
        let tx = self.pool.begin().await?;
        Ok(PgTx { tx: Mutex::new(tx) })
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenant (name, industry, contact_email, default_radius_km, default_max_deliveries)
            VALUES ($1, COALESCE($2, 'retail'), $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant.name)
        .bind(tenant.industry)
        .bind(tenant.contact_email)
        .bind(tenant.default_radius_km)
        .bind(tenant.default_max_deliveries)
        .fetch_one(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, AppError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employee (tenant_id, first_name, last_name, email, role, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(employee.tenant_id)
        .bind(employee.first_name)
        .bind(employee.last_name)
        .bind(employee.email)
        .bind(employee.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn set_availability(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        active: bool,
    ) -> Result<Availability, AppError> {
        let availability = sqlx::query_as::<_, Availability>(
            r#"
            INSERT INTO availability (tenant_id, employee_id, available_date, active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, employee_id, available_date)
            DO UPDATE SET active = EXCLUDED.active
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(date)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;
        Ok(availability)
    }

    async fn insert_truck(&self, truck: NewTruck) -> Result<Truck, AppError> {
        let truck = sqlx::query_as::<_, Truck>(
            r#"
            INSERT INTO truck (tenant_id, name, active)
            VALUES ($1, $2, TRUE)
            RETURNING *
            "#,
        )
        .bind(truck.tenant_id)
        .bind(truck.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(truck)
    }

    async fn ensure_product(
        &self,
        tenant_id: Uuid,
        name: &str,
        category: Option<&str>,
    ) -> Result<Product, AppError> {
        let existing = sqlx::query_as::<_, Product>(
            "SELECT * FROM product WHERE tenant_id = $1 AND name = $2",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(product) = existing {
            return Ok(product);
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO product (tenant_id, name, category, stock_qty)
            VALUES ($1, $2, COALESCE($3, 'custom'), 9999)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<CustomerOrder, AppError> {
        // Pedido e itens em uma transação própria.
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, CustomerOrder>(
            r#"
            INSERT INTO customer_order (tenant_id, customer_id, seller_id, order_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(order.tenant_id)
        .bind(order.customer_id)
        .bind(order.seller_id)
        .bind(order.order_date)
        .bind(OrderStatus::New)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_item (tenant_id, order_id, product_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.tenant_id)
            .bind(created.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }
}
