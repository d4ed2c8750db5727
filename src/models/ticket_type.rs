use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// price хранится как NUMERIC, читаем через price::FLOAT8
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: f64,
}
