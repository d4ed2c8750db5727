//! statistics.rs
//!
//! Две ad-hoc статистики поверх сервисного слоя:
//! - GET /statistics/event/{id} — доля отмененных заказов события;
//! - GET /statistics/cancellation_dates — максимальный quantity среди
//!   отмененных заказов и дата создания этого заказа.
//!
//! Имена полей второго ответа (включая хвостовой пробел в
//! "Maximum cancelled tickets ") — наблюдаемый контракт, не менять.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::services::statistics::{self, CancellationPeak};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/statistics/event/{id}", get(get_event_statistics))
        .route("/statistics/cancellation_dates", get(get_cancellation_dates))
}

// GET /statistics/event/{id}
async fn get_event_statistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "event id must be > 0".to_string()));
    }

    let stats = statistics::event_stats(&state.db.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("get_event_statistics sql error for {}: {:?}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to compute statistics".to_string())
        })?;

    let stats = stats.ok_or((StatusCode::NOT_FOUND, "Event not found".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "Event": format!("{} - {}", stats.event_id, stats.event_name),
            "total_orders": stats.total_orders,
            "total_cancelled_orders": stats.total_cancelled_orders,
            "cancellation_rate": stats.cancellation_rate(),
        })),
    ))
}

fn cancellation_dates_body(peak: &CancellationPeak) -> Value {
    let date = match peak.date {
        Some(d) => json!(d.format("%Y-%m-%d %H:%M:%S%:z").to_string()),
        None => Value::Null,
    };
    json!({
        "date with most cancelled tickets": date,
        "Maximum cancelled tickets ": peak.max_quantity,
    })
}

// GET /statistics/cancellation_dates
async fn get_cancellation_dates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let peak = statistics::cancellation_peak(&state.db.pool)
        .await
        .map_err(|e| {
            tracing::error!("get_cancellation_dates sql error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to compute statistics".to_string())
        })?;

    Ok((StatusCode::OK, Json(cancellation_dates_body(&peak))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn body_keeps_observed_field_names() {
        let peak = CancellationPeak {
            max_quantity: 5,
            date: Some(Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap()),
        };
        let body = cancellation_dates_body(&peak);

        assert_eq!(body["Maximum cancelled tickets "], 5);
        assert_eq!(
            body["date with most cancelled tickets"],
            "2025-06-03 10:00:00+00:00"
        );
    }

    #[test]
    fn body_without_cancellations_has_null_date_and_zero() {
        let peak = CancellationPeak { max_quantity: 0, date: None };
        let body = cancellation_dates_body(&peak);

        assert!(body["date with most cancelled tickets"].is_null());
        assert_eq!(body["Maximum cancelled tickets "], 0);
    }
}
