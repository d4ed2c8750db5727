//! Persistence tests for booking and cancellation
//!
//! These exercise the transactional invariants against a real Postgres:
//! a fulfilled order owns exactly the requested number of previously free
//! tickets, a failed booking leaves no order row behind, and cancellation
//! only ever touches the order state.
//!
//! `sqlx::test` provisions a throwaway database per test and applies the
//! embedded migrations, so a server must be reachable via DATABASE_URL.
//! The tests are ignored by default; run them with `cargo test -- --ignored`.

use chrono::Utc;
use sqlx::PgPool;

use ticket_sales::services::booking::{self, BookingError};
use ticket_sales::services::cancellation::{self, CancellationOutcome};

/// Создает пользователя, событие и тип билета с `available` свободными билетами.
async fn seed_ticket_type(pool: &PgPool, available: i64) -> (i32, i64) {
    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (email, password_hash, first_name, surname)
         VALUES ('buyer@test.kz', 'x', 'Test', 'Buyer')
         RETURNING user_id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let event_id: i64 = sqlx::query_scalar(
        "INSERT INTO events (name, datetime_start)
         VALUES ('Concert', NOW() + INTERVAL '7 days')
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let ticket_type_id: i64 = sqlx::query_scalar(
        "INSERT INTO ticket_types (event_id, name, price)
         VALUES ($1, 'Standard', 100.00)
         RETURNING id",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO tickets (ticket_type_id) SELECT $1 FROM generate_series(1, $2)")
        .bind(ticket_type_id)
        .bind(available)
        .execute(pool)
        .await
        .unwrap();

    (user_id, ticket_type_id)
}

async fn count_scalar(pool: &PgPool, sql: &str, bind: i64) -> i64 {
    sqlx::query_scalar(sql).bind(bind).fetch_one(pool).await.unwrap()
}

async fn order_state_name(pool: &PgPool, order_id: i64) -> String {
    sqlx::query_scalar(
        "SELECT s.name FROM orders o JOIN order_states s ON s.id = o.state_id WHERE o.id = $1",
    )
    .bind(order_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "requires a running Postgres (cargo test -- --ignored)"]
async fn fulfilled_order_owns_exactly_requested_tickets(pool: PgPool) {
    let (user_id, ticket_type_id) = seed_ticket_type(&pool, 5).await;

    let booked = booking::book_order(&pool, user_id, ticket_type_id, 3)
        .await
        .unwrap();
    assert_eq!(booked.ticket_ids.len(), 3);

    // заказ сохранен и владеет ровно тремя билетами
    let orders = count_scalar(&pool, "SELECT COUNT(*) FROM orders WHERE user_id = $1", user_id as i64).await;
    assert_eq!(orders, 1);
    let owned = count_scalar(&pool, "SELECT COUNT(*) FROM tickets WHERE order_id = $1", booked.id).await;
    assert_eq!(owned, 3);

    // остальные билеты типа остались свободными
    let free = count_scalar(
        &pool,
        "SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1 AND order_id IS NULL",
        ticket_type_id,
    )
    .await;
    assert_eq!(free, 2);

    assert_eq!(order_state_name(&pool, booked.id).await, "Created");
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "requires a running Postgres (cargo test -- --ignored)"]
async fn failed_booking_leaves_no_order_behind(pool: PgPool) {
    let (user_id, ticket_type_id) = seed_ticket_type(&pool, 2).await;

    let err = booking::book_order(&pool, user_id, ticket_type_id, 3)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SoldOut { requested: 3, available: 2 }));

    // откат: ни заказа, ни частично захваченных билетов
    let orders = count_scalar(&pool, "SELECT COUNT(*) FROM orders WHERE user_id = $1", user_id as i64).await;
    assert_eq!(orders, 0);
    let free = count_scalar(
        &pool,
        "SELECT COUNT(*) FROM tickets WHERE ticket_type_id = $1 AND order_id IS NULL",
        ticket_type_id,
    )
    .await;
    assert_eq!(free, 2);
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "requires a running Postgres (cargo test -- --ignored)"]
async fn cancellation_within_window_only_changes_state(pool: PgPool) {
    let (user_id, ticket_type_id) = seed_ticket_type(&pool, 4).await;
    let booked = booking::book_order(&pool, user_id, ticket_type_id, 2)
        .await
        .unwrap();

    let outcome = cancellation::cancel_order(&pool, user_id, booked.id, Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, CancellationOutcome::Cancelled(_)));

    assert_eq!(order_state_name(&pool, booked.id).await, "Cancelled");

    // билеты не возвращаются в пул: заказ по-прежнему владеет ими
    let owned = count_scalar(&pool, "SELECT COUNT(*) FROM tickets WHERE order_id = $1", booked.id).await;
    assert_eq!(owned, 2);
}

#[sqlx::test(migrations = "./src/migrations")]
#[ignore = "requires a running Postgres (cargo test -- --ignored)"]
async fn expired_cancellation_leaves_state_unchanged(pool: PgPool) {
    let (user_id, ticket_type_id) = seed_ticket_type(&pool, 4).await;
    let booked = booking::book_order(&pool, user_id, ticket_type_id, 2)
        .await
        .unwrap();

    // заказу уже 31 минута
    sqlx::query("UPDATE orders SET created_at = NOW() - INTERVAL '31 minutes' WHERE id = $1")
        .bind(booked.id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = cancellation::cancel_order(&pool, user_id, booked.id, Utc::now())
        .await
        .unwrap();
    assert!(matches!(outcome, CancellationOutcome::WindowExpired));

    assert_eq!(order_state_name(&pool, booked.id).await, "Created");
}
