use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;

use tracing::error;

use crate::server::{app_state::AppState, error::ServerError};

pub fn health_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/detailed", get(health_detailed))
        .with_state(state.clone())
}

async fn health() -> impl IntoResponse {
    "OK".into_response()
}

async fn health_detailed(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let platform = true;
    let service = state.get_quiz_service();

    let provider_status = match service.generator().provider().total_count().await {
        Ok(_) => true,
        Err(e) => {
            error!("Failed Pokémon provider health check: {}", e);
            false
        }
    };

    let json = json!({
        "platform": platform,
        "provider": provider_status,
        "active_sessions": service.store().len(),
        "active_room_codes": service.vault().active_count(),
    });

    Ok((StatusCode::OK, Json(json)))
}
