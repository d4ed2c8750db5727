pub mod events;
pub mod orders;
pub mod cancellations;
pub mod statistics;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(orders::routes())
        .merge(cancellations::routes())
        .merge(statistics::routes())
}
