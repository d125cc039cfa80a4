mod analyze;
mod health;
mod index;
mod metrics;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use leaf_detection::Detector;

pub fn api_routes<D: Detector>() -> Router<SharedState<D>> {
    Router::new()
        .route("/", get(index::index))
        .route("/analyze", post(analyze::analyze::<D>))
        .route("/health_check", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler::<D>))
}
