//! booking.rs
//!
//! Сервисный слой бронирования: создание заказа и захват билетов.
//!
//! Вся операция идет в одной транзакции: либо заказ получает ровно
//! `quantity` свободных билетов своего типа, либо транзакция откатывается
//! и заказ не сохраняется вовсе (частичных броней не бывает).
//!
//! Захват билетов делается через `FOR UPDATE SKIP LOCKED`, поэтому два
//! конкурентных заказа не могут забрать один и тот же билет.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::warn;

use crate::models::Ticket;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("not enough tickets: requested {requested}, available {available}")]
    SoldOut { requested: i32, available: i32 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Успешно забронированный заказ.
#[derive(Debug)]
pub struct BookedOrder {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub ticket_ids: Vec<i64>,
}

/// Создает заказ в состоянии `Created` и закрепляет за ним `quantity`
/// свободных билетов типа `ticket_type_id`.
pub async fn book_order(
    pool: &PgPool,
    user_id: i32,
    ticket_type_id: i64,
    quantity: i32,
) -> Result<BookedOrder, BookingError> {
    let mut tx = pool.begin().await?;

    let (order_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO orders (user_id, ticket_type_id, quantity, state_id)
        VALUES ($1, $2, $3, (SELECT id FROM order_states WHERE name = 'Created'))
        RETURNING id, created_at
        "#
    )
    .bind(user_id)
    .bind(ticket_type_id)
    .bind(quantity)
    .fetch_one(&mut *tx)
    .await?;

    // Захватываем свободные билеты; SKIP LOCKED исключает гонку
    // двух заказов за один билет.
    let claimed: Vec<Ticket> = sqlx::query_as(
        r#"
        UPDATE tickets
        SET order_id = $1
        WHERE id IN (
            SELECT id FROM tickets
            WHERE ticket_type_id = $2 AND order_id IS NULL
            ORDER BY id
            FOR UPDATE SKIP LOCKED
            LIMIT $3
        )
        RETURNING id, ticket_type_id, order_id
        "#
    )
    .bind(order_id)
    .bind(ticket_type_id)
    .bind(quantity as i64)
    .fetch_all(&mut *tx)
    .await?;

    if (claimed.len() as i32) < quantity {
        // Билетов не хватило: откатываем, заказ не остается в БД.
        let available = claimed.len() as i32;
        tx.rollback().await?;
        warn!(
            "booking rejected: ticket_type={} requested={} available={}",
            ticket_type_id, quantity, available
        );
        return Err(BookingError::SoldOut { requested: quantity, available });
    }

    tx.commit().await?;

    Ok(BookedOrder {
        id: order_id,
        created_at,
        ticket_ids: claimed.into_iter().map(|t| t.id).collect(),
    })
}
