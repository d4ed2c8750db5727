//! cancellations.rs
//!
//! Отдельная поверхность отмены заказов: список/чтение тем же сериализатором,
//! что и /orders, плюс PATCH с бизнес-правилом 30-минутного окна.
//!
//! Коды ответов сохраняют наблюдаемый контракт: истекшее окно — это 200 с
//! success=false, а не ошибка; неизвестный заказ — 400 "Cancellation failed".

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::controllers::orders::{fail, load_user_orders};
use crate::services::cancellation::{self, CancellationError, CancellationOutcome};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/cancel", get(list_cancellable))
        .route("/orders/cancel/{id}", get(get_cancellable))
        .route("/orders/cancel/{id}", patch(cancel_order))
}

// GET /orders/cancel
async fn list_cancellable(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let orders = load_user_orders(&state.db.pool, user.user_id, None)
        .await
        .map_err(|e| {
            tracing::error!("list_cancellable sql error: {:?}", e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve orders")
        })?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /orders/cancel/{id}
async fn get_cancellable(
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
            tracing::error!("get_cancellable sql error for {}: {:?}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve order")
        })?;

    match orders.pop() {
        Some(order) => Ok((StatusCode::OK, Json(order))),
        None => Err(fail(StatusCode::NOT_FOUND, "Order not found")),
    }
}

// PATCH /orders/cancel/{id}
async fn cancel_order(
    State(state): State<Arc<AppState>>,
    user: crate::middleware::AuthUser,
    Path(id): Path<i64>,
) -> Response {
    if id <= 0 {
        return fail(StatusCode::BAD_REQUEST, "order id must be > 0").into_response();
    }

    let outcome = cancellation::cancel_order(&state.db.pool, user.user_id, id, Utc::now()).await;

    match outcome {
        Ok(CancellationOutcome::Cancelled(order)) => {
            // Возвращаем полный сериализованный заказ, как и /orders/{id}.
            match load_user_orders(&state.db.pool, user.user_id, Some(order.id)).await {
                Ok(mut orders) => match orders.pop() {
                    Some(order) => (StatusCode::OK, Json(order)).into_response(),
                    None => fail(StatusCode::BAD_REQUEST, "Cancellation failed").into_response(),
                },
                Err(e) => {
                    tracing::error!("cancel_order reload sql error for {}: {:?}", id, e);
                    fail(StatusCode::BAD_REQUEST, "Cancellation failed").into_response()
                }
            }
        }
        Ok(CancellationOutcome::WindowExpired) => (
            StatusCode::OK,
            Json(json!({ "success": false, "errors": "Cancellation is not available anymore" })),
        )
            .into_response(),
        Err(CancellationError::NotFound) => {
            fail(StatusCode::BAD_REQUEST, "Cancellation failed").into_response()
        }
        Err(CancellationError::StateMissing) => {
            tracing::error!("cancel_order: 'Cancelled' state is missing from order_states");
            (StatusCode::NOT_FOUND, "Order state not found".to_string()).into_response()
        }
        Err(CancellationError::Database(e)) => {
            tracing::error!("cancel_order sql error for {}: {:?}", id, e);
            fail(StatusCode::BAD_REQUEST, "Cancellation failed").into_response()
        }
    }
}
