use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Справочное состояние заказа ("Created", "Cancelled", ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderState {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i32,
    pub ticket_type_id: i64,
    pub quantity: i32,
    pub state_id: i32,
    pub created_at: DateTime<Utc>,
}
