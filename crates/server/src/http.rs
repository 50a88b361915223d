use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use registrar_agent::session::SessionStore;
use registrar_db::DbPool;

use crate::bootstrap::AppEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AppEngine>,
    pub sessions: Arc<dyn SessionStore>,
    pub db_pool: DbPool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/clear", post(clear))
        .with_state(state)
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "success".to_string(),
        message: "Registration assistant API is running".to_string(),
    })
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<StatusResponse>) {
    match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "success".to_string(),
                message: "API is healthy".to_string(),
            }),
        ),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse { status: "error".to_string(), message: error.to_string() }),
        ),
    }
}

/// One conversation turn. Session ids are minted server-side when absent;
/// concurrent requests for the same session id are not serialized here and
/// can lose turns to each other.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let previous = state.sessions.get(&session_id).await;
    if previous.is_none() {
        tracing::info!(
            event_name = "http.session_created",
            session_id = %session_id,
            "created new session"
        );
    }

    let (response, new_state) = state.engine.process_turn(&request.message, previous).await;
    state.sessions.put(&session_id, new_state).await;

    Json(ChatResponse { response, session_id })
}

async fn clear(
    State(state): State<AppState>,
    Json(request): Json<ClearRequest>,
) -> Json<StatusResponse> {
    let removed = state.sessions.remove(&request.session_id).await;
    if removed {
        tracing::info!(
            event_name = "http.session_cleared",
            session_id = %request.session_id,
            "cleared session"
        );
    }

    Json(StatusResponse {
        status: "success".to_string(),
        message: "Conversation cleared".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, AppState};
    use crate::bootstrap::{bootstrap_with_config, in_memory_config};

    async fn test_router() -> axum::Router {
        let app =
            bootstrap_with_config(in_memory_config()).await.expect("bootstrap should succeed");

        router(AppState { engine: app.engine, sessions: app.sessions, db_pool: app.db_pool })
    }

    async fn post_json(router: &axum::Router, uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request builds");

        let response = router.clone().oneshot(request).await.expect("request succeeds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_endpoint_reports_success() {
        let router = test_router().await;

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_mints_a_session_id_and_replies() {
        let router = test_router().await;

        let (status, payload) = post_json(&router, "/api/chat", json!({ "message": "help" })).await;

        assert_eq!(status, StatusCode::OK);
        assert!(!payload["session_id"].as_str().unwrap_or("").is_empty());
        assert!(payload["response"].as_str().unwrap_or("").contains("Create Registration"));
    }

    #[tokio::test]
    async fn chat_keeps_per_session_state_across_requests() {
        let router = test_router().await;

        let (_status, first) =
            post_json(&router, "/api/chat", json!({ "message": "create" })).await;
        let session_id = first["session_id"].as_str().expect("session id").to_string();
        assert!(first["response"].as_str().unwrap_or("").contains("full name"));

        let (_status, second) = post_json(
            &router,
            "/api/chat",
            json!({ "message": "Alice Johnson", "session_id": session_id }),
        )
        .await;

        // Mid-collection: the second message is consumed as the name value.
        assert!(second["response"].as_str().unwrap_or("").contains("Email Address"));
        assert_eq!(second["session_id"].as_str(), Some(session_id.as_str()));
    }

    #[tokio::test]
    async fn clear_resets_the_conversation() {
        let router = test_router().await;

        let (_status, first) =
            post_json(&router, "/api/chat", json!({ "message": "create" })).await;
        let session_id = first["session_id"].as_str().expect("session id").to_string();

        let (status, cleared) =
            post_json(&router, "/api/clear", json!({ "session_id": session_id })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["status"], "success");

        // The next turn starts from a fresh state: "Alice Johnson" is no
        // longer a field value, it gets classified (and defaults to help).
        let (_status, after) = post_json(
            &router,
            "/api/chat",
            json!({ "message": "Alice Johnson", "session_id": session_id }),
        )
        .await;
        assert!(after["response"].as_str().unwrap_or("").contains("What would you like to do?"));
    }
}
