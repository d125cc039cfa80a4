use crate::server::SharedState;
use axum::{extract::State, response::IntoResponse};
use leaf_detection::Detector;
use prometheus::{Encoder, TextEncoder};

pub async fn metrics_handler<D: Detector>(State(state): State<SharedState<D>>) -> impl IntoResponse {
    let metric_families = state.metrics.registry.gather();

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();

    String::from_utf8(buffer).unwrap().into_response()
}
