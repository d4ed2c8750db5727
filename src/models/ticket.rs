use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// order_id = NULL — билет свободен; после брони принадлежит ровно одному заказу.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub ticket_type_id: i64,
    pub order_id: Option<i64>,
}
