use serde::Serialize;

use crate::server::routes::{json_response, HttpResponse};
use crate::server::AppState;

#[derive(Debug, Serialize, PartialEq)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model: &'static str,
}

/// `GET /health`. Triggers the model load on first call.
pub fn handle(state: &AppState) -> HttpResponse {
    json_response(200, &health(state))
}

pub fn health(state: &AppState) -> HealthStatus {
    let model = if state.classifier.ensure_loaded() { "loaded" } else { "not loaded" };
    HealthStatus { status: "healthy", model }
}
