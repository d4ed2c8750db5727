//! statistics.rs
//!
//! Две независимые read-only статистики:
//! - по событию: доля отмененных заказов среди всех заказов события;
//! - глобально: максимальный quantity среди отмененных заказов (скан по
//!   билетам) и дата создания этого заказа.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

#[derive(Debug)]
pub struct EventStats {
    pub event_id: i64,
    pub event_name: String,
    pub total_orders: i64,
    pub total_cancelled_orders: i64,
}

impl EventStats {
    pub fn cancellation_rate(&self) -> String {
        format_rate(self.total_cancelled_orders, self.total_orders)
    }
}

// Событие без заказов — это "0.0%", а не деление на ноль.
pub fn format_rate(cancelled: i64, total: i64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", 100.0 * cancelled as f64 / total as f64)
}

/// Считает заказы и отмененные заказы по всем типам билетов события.
/// `None`, если событие не найдено.
pub async fn event_stats(pool: &PgPool, event_id: i64) -> Result<Option<EventStats>, sqlx::Error> {
    let event: Option<(i64, String)> = sqlx::query_as(
        "SELECT id, name FROM events WHERE id = $1"
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    let Some((id, name)) = event else {
        return Ok(None);
    };

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(o.id)::int8 AS total,
            COUNT(o.id) FILTER (WHERE s.name = 'Cancelled')::int8 AS cancelled
        FROM orders o
        JOIN ticket_types tt ON tt.id = o.ticket_type_id
        LEFT JOIN order_states s ON s.id = o.state_id
        WHERE tt.event_id = $1
        "#
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;

    Ok(Some(EventStats {
        event_id: id,
        event_name: name,
        total_orders: row.get("total"),
        total_cancelled_orders: row.get("cancelled"),
    }))
}

#[derive(Debug, PartialEq)]
pub struct CancellationPeak {
    pub max_quantity: i32,
    pub date: Option<DateTime<Utc>>,
}

/// Скан по (quantity, created_at) билетов отмененных заказов: строгое `>`
/// означает, что при равенстве побеждает первая встреченная запись.
pub fn peak_cancellation<I>(tickets: I) -> CancellationPeak
where
    I: IntoIterator<Item = (i32, DateTime<Utc>)>,
{
    let mut max_cancelled = 0;
    let mut max_cancelled_date = None;

    for (quantity, created_at) in tickets {
        if quantity > max_cancelled {
            max_cancelled = quantity;
            max_cancelled_date = Some(created_at);
        }
    }

    CancellationPeak { max_quantity: max_cancelled, date: max_cancelled_date }
}

/// Обходит все билеты отмененных заказов в порядке id билета.
pub async fn cancellation_peak(pool: &PgPool) -> Result<CancellationPeak, sqlx::Error> {
    let rows: Vec<(i32, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT o.quantity, o.created_at
        FROM tickets t
        JOIN orders o ON o.id = t.order_id
        JOIN order_states s ON s.id = o.state_id
        WHERE s.name = 'Cancelled'
        ORDER BY t.id
        "#
    )
    .fetch_all(pool)
    .await?;

    Ok(peak_cancellation(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, 10, 0, 0).unwrap()
    }

    #[test]
    fn rate_is_formatted_with_one_decimal() {
        assert_eq!(format_rate(3, 10), "30.0%");
        assert_eq!(format_rate(2, 7), "28.6%");
        assert_eq!(format_rate(10, 10), "100.0%");
    }

    #[test]
    fn rate_for_event_without_orders_is_zero() {
        assert_eq!(format_rate(0, 0), "0.0%");
    }

    #[test]
    fn peak_picks_largest_cancelled_quantity() {
        // отмененные заказы с quantity 2 и 5; активный (3) сюда не попадает
        let tickets = vec![(2, day(1)), (2, day(1)), (5, day(3)), (5, day(3))];
        let peak = peak_cancellation(tickets);
        assert_eq!(peak.max_quantity, 5);
        assert_eq!(peak.date, Some(day(3)));
    }

    #[test]
    fn peak_over_no_cancelled_tickets_is_empty() {
        let peak = peak_cancellation(Vec::new());
        assert_eq!(peak.max_quantity, 0);
        assert_eq!(peak.date, None);
    }

    #[test]
    fn peak_keeps_first_record_on_tie() {
        let tickets = vec![(4, day(2)), (4, day(7))];
        let peak = peak_cancellation(tickets);
        assert_eq!(peak.max_quantity, 4);
        assert_eq!(peak.date, Some(day(2)));
    }
}
