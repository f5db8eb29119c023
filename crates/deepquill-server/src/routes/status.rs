//! Service status route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;
use deepquill_genai::{CHAT_MODEL, DEEP_DIVE_MODEL};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "genaiAvailable": state.genai_available(),
        "chatModel": CHAT_MODEL,
        "deepDiveModel": DEEP_DIVE_MODEL,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::build_router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deepquill_core::DeepQuillConfig;
    use tower::ServiceExt;

    fn temp_state(dir: &tempfile::TempDir) -> AppState {
        let config = DeepQuillConfig::from_env(dir.path()).unwrap();
        AppState::new(config)
    }

    #[tokio::test]
    async fn test_status_route_reports_models() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(Arc::new(temp_state(&dir)));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["genaiAvailable"].is_boolean());
        assert_eq!(body["chatModel"], CHAT_MODEL);
        assert_eq!(body["deepDiveModel"], DEEP_DIVE_MODEL);
    }

    #[test]
    fn test_genai_available_with_persisted_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = temp_state(&dir);
        std::fs::write(
            &state.config.data_paths.genai_config_file,
            r#"{"apiKey":"k"}"#,
        )
        .unwrap();
        assert!(state.genai_available());
    }

    #[test]
    fn test_genai_unavailable_without_key() {
        // Only meaningful when the environment doesn't already hold a key
        if std::env::var(deepquill_genai::API_KEY_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        assert!(!temp_state(&dir).genai_available());
    }
}
