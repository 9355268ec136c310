// src/db.rs
//
// A camada de persistência como colaborador externo do núcleo: o
// agendamento fala com este seam, nunca com SQL direto. `PgStore` é o
// backend de produção; `MemStore` atende testes e demonstrações.

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::geo::Coordinates;
use crate::models::fleet::{Availability, Employee, NewEmployee, NewTruck, Truck};
use crate::models::orders::{CustomerOrder, NewOrder, OrderLine, Product};
use crate::models::regions::{NewRegion, NewRegionAddress, Region, RegionAddress};
use crate::models::runs::{Delivery, DeliveryOverviewRow, DeliveryRun, NewDelivery, NewRun};
use crate::models::tenancy::{NewTenant, Tenant};

/// Consultas de leitura, disponíveis tanto fora quanto dentro de uma
/// transação (o razão de capacidade e o motor de sugestões leem sem
/// trava; o alocador lê pelo `StoreTx` para enxergar um retrato
/// consistente).
#[async_trait]
pub trait StoreRead: Send + Sync {
    async fn tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;

    async fn region(&self, tenant_id: Uuid, region_id: Uuid) -> Result<Option<Region>, AppError>;

    async fn regions(&self, tenant_id: Uuid) -> Result<Vec<Region>, AppError>;

    /// Todos os endereços históricos da região, base do recálculo do centróide.
    async fn region_addresses(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
    ) -> Result<Vec<RegionAddress>, AppError>;

    /// Linhas de `RegionAddress` da região na data exata; é a contagem
    /// usada pela cota diária, independente da contabilidade das rotas.
    async fn region_delivery_count(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError>;

    /// Motoristas ativos cadastrados, disponíveis ou não.
    async fn count_drivers(&self, tenant_id: Uuid) -> Result<i64, AppError>;

    /// Motoristas ativos com linha de disponibilidade ativa na data exata.
    async fn count_available_drivers(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError>;

    async fn available_driver_ids(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>, AppError>;

    /// Caminhões ativos; a frota não é escopada por data.
    async fn count_trucks(&self, tenant_id: Uuid) -> Result<i64, AppError>;

    /// Regiões distintas com rota não cancelada agendada na data.
    async fn count_active_regions(
        &self,
        tenant_id: Uuid,
        date: NaiveDate,
    ) -> Result<i64, AppError>;

    /// Entregas não canceladas anexadas a rotas agendadas na data.
    async fn count_deliveries(&self, tenant_id: Uuid, date: NaiveDate) -> Result<i64, AppError>;

    async fn order(&self, tenant_id: Uuid, order_id: Uuid)
        -> Result<Option<CustomerOrder>, AppError>;

    /// Itens do pedido com a categoria do produto, prontos para o
    /// cálculo de minutos por parada.
    async fn order_lines(&self, tenant_id: Uuid, order_id: Uuid)
        -> Result<Vec<OrderLine>, AppError>;

    /// Itens de todos os pedidos já anexados à rota (entregas não
    /// canceladas).
    async fn run_lines(&self, tenant_id: Uuid, run_id: Uuid) -> Result<Vec<OrderLine>, AppError>;

    async fn count_run_deliveries(&self, tenant_id: Uuid, run_id: Uuid) -> Result<i64, AppError>;

    /// Listagem de entregas com região e datas, filtros opcionais.
    async fn delivery_overview(
        &self,
        tenant_id: Uuid,
        region_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DeliveryOverviewRow>, AppError>;
}

/// O escopo transacional do caminho mutante. `lock_run` adquire a trava
/// de linha que serializa requisições concorrentes para o mesmo
/// (locatário, região, data); tudo que vier depois dela enxerga o estado
/// travado. `commit`/`rollback` consomem a transação.
#[async_trait]
pub trait StoreTx: StoreRead {
    async fn lock_run(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<DeliveryRun>, AppError>;

    async fn insert_run(&self, run: NewRun) -> Result<DeliveryRun, AppError>;

    async fn insert_region(&self, region: NewRegion) -> Result<Region, AppError>;

    async fn insert_region_address(
        &self,
        address: NewRegionAddress,
    ) -> Result<RegionAddress, AppError>;

    async fn update_region_center(
        &self,
        tenant_id: Uuid,
        region_id: Uuid,
        center: Coordinates,
    ) -> Result<(), AppError>;

    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<Delivery, AppError>;

    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}

/// O store completo: leituras, abertura de transação e os cadastros
/// simples que colaboradores externos (e os testes) usam para popular o
/// locatário.
#[async_trait]
pub trait Store: StoreRead + Clone + Send + Sync + 'static {
    type Tx: StoreTx + Send + Sync;

    async fn begin(&self) -> Result<Self::Tx, AppError>;

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant, AppError>;

    async fn insert_employee(&self, employee: NewEmployee) -> Result<Employee, AppError>;

    /// Upsert: cria ou atualiza a linha de disponibilidade do
    /// funcionário na data.
    async fn set_availability(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        active: bool,
    ) -> Result<Availability, AppError>;

    async fn insert_truck(&self, truck: NewTruck) -> Result<Truck, AppError>;

    /// Busca o produto pelo nome ou o cria na hora.
    async fn ensure_product(
        &self,
        tenant_id: Uuid,
        name: &str,
        category: Option<&str>,
    ) -> Result<Product, AppError>;

    /// Cria o pedido com seus itens de forma atômica.
    async fn insert_order(&self, order: NewOrder) -> Result<CustomerOrder, AppError>;
}
