use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Event, TicketType};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub datetime_start: chrono::DateTime<chrono::Utc>,
    pub ticket_types: Vec<TicketType>,
}

fn to_response(event: Event, ticket_types: Vec<TicketType>) -> EventResponse {
    EventResponse {
        id: event.id,
        name: event.name,
        description: event.description,
        venue: event.venue,
        datetime_start: event.datetime_start,
        ticket_types,
    }
}

// GET /events
async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let events: Vec<Event> = sqlx::query_as(
        "SELECT id, name, description, venue, datetime_start
         FROM events
         ORDER BY datetime_start"
    )
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("list_events sql error: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve events".to_string())
    })?;

    let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
    let types: Vec<TicketType> = sqlx::query_as(
        "SELECT id, event_id, name, price::FLOAT8 AS price
         FROM ticket_types
         WHERE event_id = ANY($1)
         ORDER BY id"
    )
    .bind(&ids)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("list_events ticket_types sql error: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve events".to_string())
    })?;

    // группировка типов билетов по событию
    let mut by_event: BTreeMap<i64, Vec<TicketType>> = BTreeMap::new();
    for tt in types {
        by_event.entry(tt.event_id).or_default().push(tt);
    }

    let payload: Vec<EventResponse> = events
        .into_iter()
        .map(|e| {
            let types = by_event.remove(&e.id).unwrap_or_default();
            to_response(e, types)
        })
        .collect();

    Ok((StatusCode::OK, Json(payload)))
}

// GET /events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "event id must be > 0".to_string()));
    }

    let event: Option<Event> = sqlx::query_as(
        "SELECT id, name, description, venue, datetime_start FROM events WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_event sql error for {}: {:?}", id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve event".to_string())
    })?;

    let event = event.ok_or((StatusCode::NOT_FOUND, "Event not found".to_string()))?;

    let types: Vec<TicketType> = sqlx::query_as(
        "SELECT id, event_id, name, price::FLOAT8 AS price
         FROM ticket_types
         WHERE event_id = $1
         ORDER BY id"
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await
    .map_err(|e| {
        tracing::error!("get_event ticket_types sql error for {}: {:?}", id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve event".to_string())
    })?;

    Ok((StatusCode::OK, Json(to_response(event, types))))
}
