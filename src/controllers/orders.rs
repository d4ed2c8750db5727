//! orders.rs
//!
//! Заказы пользователя: список, чтение, создание (бронирование билетов)
//! и частичное обновление. Все операции ограничены заказами
//! аутентифицированного пользователя.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

use crate::services::booking::{self, BookingError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(get_user_orders))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}", patch(update_order))
}

/* ---------- helpers ---------- */

pub(crate) fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "success": false, "errors": message })))
}

#[derive(Debug, Serialize)]
pub struct OrderTicket { pub id: i64 }

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i32,
    pub ticket_type_id: i64,
    pub quantity: i32,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<OrderTicket>,
}

// Заказы пользователя вместе с именем состояния и id их билетов.
pub(crate) async fn load_user_orders(
    pool: &sqlx::PgPool,
    user_id: i32,
    order_id: Option<i64>,
) -> sqlx::Result<Vec<OrderResponse>> {
    let mut q = String::from(
        r#"
        SELECT o.id AS oid, o.user_id AS uid, o.ticket_type_id AS ttid,
               o.quantity AS qty, s.name AS state, o.created_at AS created,
               t.id AS tid
        FROM orders o
        JOIN order_states s ON s.id = o.state_id
        LEFT JOIN tickets t ON t.order_id = o.id
        WHERE o.user_id = $1
        "#,
    );
    if order_id.is_some() {
        q.push_str(" AND o.id = $2");
    }
    q.push_str(" ORDER BY o.created_at DESC, t.id");

    let mut dbq = sqlx::query(&q).bind(user_id);
    if let Some(oid) = order_id {
        dbq = dbq.bind(oid);
    }
    let rows = dbq.fetch_all(pool).await?;

    // группировка билетов по заказу
    let mut map: BTreeMap<i64, (i32, i64, i32, String, DateTime<Utc>, Vec<i64>)> = BTreeMap::new();
    for r in rows {
        let oid: i64 = r.get("oid");
        let tid: Option<i64> = r.try_get("tid").ok();
        let e = map.entry(oid).or_insert((
            r.get("uid"),
            r.get("ttid"),
            r.get("qty"),
            r.get("state"),
            r.get("created"),
            Vec::new(),
        ));
        if let Some(tid) = tid {
            e.5.push(tid);
        }
    }

    Ok(map
        .into_iter()
        .map(|(oid, (uid, ttid, qty, state, created, tickets))| OrderResponse {
            id: oid,
            user_id: uid,
            ticket_type_id: ttid,
            quantity: qty,
            state,
            created_at: created,
            tickets: tickets.into_iter().map(|id| OrderTicket { id }).collect(),
        })
        .collect())
}

/* ---------- ORDERS ---------- */

// GET /orders
async fn get_user_orders(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let orders = load_user_orders(&state.db.pool, user.user_id, None)
        .await
        .map_err(|e| {
            tracing::error!("get_user_orders sql error: {:?}", e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve orders")
        })?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /orders/{id}
async fn get_order(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if id <= 0 {
        return Err(fail(StatusCode::BAD_REQUEST, "order id must be > 0"));
    }

    let mut orders = load_user_orders(&state.db.pool, user.user_id, Some(id))
        .await
        .map_err(|e| {
            tracing::error!("get_order sql error for {}: {:?}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve order")
        })?;

    match orders.pop() {
        Some(order) => Ok((StatusCode::OK, Json(order))),
        None => Err(fail(StatusCode::NOT_FOUND, "Order not found")),
    }
}

// POST /orders
#[derive(Debug, Deserialize, Validate)]
struct CreateOrderRequest {
    #[validate(range(min = 1))]
    pub ticket_type_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errors": e.to_string() })),
        ));
    }

    let booked = booking::book_order(&state.db.pool, user.user_id, req.ticket_type_id, req.quantity)
        .await
        .map_err(|e| {
            match &e {
                BookingError::SoldOut { .. } => {
                    tracing::warn!("create_order: {}", e);
                }
                BookingError::Database(err) => {
                    tracing::error!("create_order sql error: {:?}", err);
                }
            }
            // Контракт не различает "распродано" и внутреннюю ошибку.
            fail(StatusCode::BAD_REQUEST, "Couldn't book tickets")
        })?;

    // Сериализуем прямо из результата бронирования, без повторного чтения.
    let order = OrderResponse {
        id: booked.id,
        user_id: user.user_id,
        ticket_type_id: req.ticket_type_id,
        quantity: req.quantity,
        state: "Created".to_string(),
        created_at: booked.created_at,
        tickets: booked.ticket_ids.into_iter().map(|id| OrderTicket { id }).collect(),
    };

    Ok((StatusCode::CREATED, Json(order)))
}

// PATCH /orders/{id}
#[derive(Debug, Deserialize, Validate)]
struct UpdateOrderRequest {
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if id <= 0 {
        return Err(fail(StatusCode::BAD_REQUEST, "order id must be > 0"));
    }
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errors": e.to_string() })),
        ));
    }

    if let Some(quantity) = req.quantity {
        let updated = sqlx::query(
            "UPDATE orders SET quantity = $1 WHERE id = $2 AND user_id = $3"
        )
        .bind(quantity)
        .bind(id)
        .bind(user.user_id)
        .execute(&state.db.pool)
        .await
        .map(|r| r.rows_affected() > 0)
        .map_err(|e| {
            tracing::error!("update_order sql error for {}: {:?}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update order")
        })?;

        if !updated {
            return Err(fail(StatusCode::NOT_FOUND, "Order not found"));
        }
    }

    let mut orders = load_user_orders(&state.db.pool, user.user_id, Some(id))
        .await
        .map_err(|e| {
            tracing::error!("update_order reload sql error for {}: {:?}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve order")
        })?;

    match orders.pop() {
        Some(order) => Ok((StatusCode::OK, Json(order))),
        None => Err(fail(StatusCode::NOT_FOUND, "Order not found")),
    }
}
