use axum::{Router, extract::State, response::Json, routing::get};
use serde_json::{Value, json};

use crate::errors::ApiError;
use crate::server::AppState;

/// Health check endpoint handler.
///
/// Returns a small JSON document once the store has answered a round trip.
/// Used by load balancers and container orchestrators to verify the service
/// can actually serve requests, not just accept connections.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// # Response Format
/// ```json
/// {
///   "status": "pong",
///   "store": "ok"
/// }
/// ```
///
/// # HTTP Status Codes
/// - **200 OK**: Server and store are healthy
/// - **500 Internal Server Error**: The store did not answer
///
/// # Examples
/// ```bash
/// curl http://localhost:4000/ping
/// # Response: {"status":"pong","store":"ok"}
/// ```
pub async fn ping(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.health_check().await?;
    Ok(Json(json!({ "status": "pong", "store": "ok" })))
}

/// Smoke test used by the frontend during development
pub async fn test() -> Json<&'static str> {
    Json("test ok")
}

pub fn create_health_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/api/test", get(test))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_utils::TestApp;

    #[tokio::test]
    async fn test_ping_reports_store() {
        let app = TestApp::new();
        let (status, body) = app.get("/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pong");
        assert_eq!(body["store"], "ok");
    }

    #[tokio::test]
    async fn test_smoke_endpoint() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "test ok");
    }
}
