//! cancellation.rs
//!
//! Отмена заказа: разрешена только в течение 30 минут после создания
//! и меняет исключительно state_id. Билеты при отмене НЕ возвращаются
//! в свободный пул — это наблюдаемое поведение системы, см. DESIGN.md.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

use crate::models::{Order, OrderState};

/// Окно отмены после создания заказа, в минутах.
pub const CANCELLATION_WINDOW_MINUTES: i64 = 30;

/// Ровно 30:00 от создания — еще можно отменить (сравнение строгое `>`),
/// но уже 30:00.5 — нет, поэтому считаем в миллисекундах, без усечения.
pub fn within_cancellation_window(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let elapsed_minutes = now.signed_duration_since(created_at).num_milliseconds() as f64 / 60_000.0;
    elapsed_minutes <= CANCELLATION_WINDOW_MINUTES as f64
}

#[derive(Debug)]
pub enum CancellationOutcome {
    /// Заказ переведен в состояние `Cancelled`.
    Cancelled(Order),
    /// Окно отмены истекло, состояние не менялось.
    WindowExpired,
}

#[derive(Debug, Error)]
pub enum CancellationError {
    #[error("order not found")]
    NotFound,
    #[error("'Cancelled' state is missing from order_states")]
    StateMissing,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Пытается отменить заказ `order_id` пользователя `user_id` на момент `now`.
pub async fn cancel_order(
    pool: &PgPool,
    user_id: i32,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<CancellationOutcome, CancellationError> {
    let order: Option<Order> = sqlx::query_as(
        "SELECT id, user_id, ticket_type_id, quantity, state_id, created_at
         FROM orders
         WHERE id = $1 AND user_id = $2"
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let order = order.ok_or(CancellationError::NotFound)?;

    if !within_cancellation_window(order.created_at, now) {
        return Ok(CancellationOutcome::WindowExpired);
    }

    let cancelled: Option<OrderState> = sqlx::query_as(
        "SELECT id, name FROM order_states WHERE name = 'Cancelled'"
    )
    .fetch_optional(pool)
    .await?;

    let cancelled = cancelled.ok_or(CancellationError::StateMissing)?;

    // Типизированная команда: меняется только state_id.
    sqlx::query("UPDATE orders SET state_id = $1 WHERE id = $2")
        .bind(cancelled.id)
        .bind(order.id)
        .execute(pool)
        .await?;

    Ok(CancellationOutcome::Cancelled(Order { state_id: cancelled.id, ..order }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn allows_cancellation_at_29_minutes() {
        let now = created() + Duration::minutes(29);
        assert!(within_cancellation_window(created(), now));
    }

    #[test]
    fn allows_cancellation_at_exactly_30_minutes() {
        let now = created() + Duration::minutes(30);
        assert!(within_cancellation_window(created(), now));
    }

    #[test]
    fn rejects_cancellation_at_31_minutes() {
        let now = created() + Duration::minutes(31);
        assert!(!within_cancellation_window(created(), now));
    }

    #[test]
    fn rejects_cancellation_one_second_past_the_window() {
        let now = created() + Duration::minutes(30) + Duration::seconds(1);
        assert!(!within_cancellation_window(created(), now));
    }

    #[test]
    fn rejects_cancellation_half_a_second_past_the_window() {
        let now = created() + Duration::minutes(30) + Duration::milliseconds(500);
        assert!(!within_cancellation_window(created(), now));
    }
}
