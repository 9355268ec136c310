// src/models/orders.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

/// Produto do catálogo. A `category` alimenta a tabela de minutos por
/// parada; categorias desconhecidas caem no padrão da política.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub stock_qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    // O cliente pertence ao CRM, fora deste núcleo; guardamos só a referência.
    pub customer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Linha de leitura usada no cálculo de minutos por parada: o join de
/// item + produto que o store devolve pronto.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_name: String,
    pub category: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub tenant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub order_date: NaiveDate,
    #[validate(length(min = 1, message = "o pedido precisa de ao menos um item"), nested)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantidade deve ser positiva"))]
    pub quantity: i32,
}
