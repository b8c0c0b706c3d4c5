use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app_state::AppState;

const SERVICE_NAME: &str = "Procurement Backend";

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/api/health", get(service_health))
        .route("/api/test", get(api_test))
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/schema", get(schema_check))
}

async fn banner() -> &'static str {
    "Procurement Backend is Running!"
}

async fn service_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn api_test() -> Json<Value> {
    Json(json!({
        "message": "Backend API is working!",
        "timestamp": Utc::now().to_rfc3339(),
        "endpoints": {
            "stripe": "/api/stripe/create-payment-intent (POST)",
            "test": "/api/test (GET)",
            "health": "/api/health (GET)",
        },
    }))
}

/// Process is up; the database is not consulted.
async fn liveness_check() -> Json<Value> {
    Json(json!({ "success": true, "message": "API is live" }))
}

/// 503 while the database is unreachable.
async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.store.ping().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "success": false, "error": "Database unavailable", "details": e.to_string() })),
        )
    })?;
    Ok(Json(json!({ "success": true, "message": "API is ready" })))
}

async fn schema_check(State(state): State<AppState>) -> Json<Value> {
    let available = state.capabilities.payment_tracking();
    Json(json!({
        "success": true,
        "payment_tracking": available,
        "message": if available {
            "Payment tracking schema is installed"
        } else {
            "Payment tracking schema is missing; payments work but are not recorded locally"
        },
    }))
}
