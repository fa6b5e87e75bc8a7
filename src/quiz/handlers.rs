use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::debug;

use crate::{
    quiz::models::{
        CreateSessionRequest, JoinRequest, PlayerRequest, StateQuery, SubmitAnswerRequest,
    },
    server::{app_state::AppState, error::ServerError},
};

pub fn quiz_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/single", post(create_single_player))
        .route("/multi", post(create_multiplayer))
        .route("/join", post(join_game))
        .route("/{session_id}/start", post(start_game))
        .route("/{session_id}/answer", post(submit_answer))
        .route("/{session_id}/next", post(next_question))
        .route("/{session_id}/state", get(get_state))
        .route("/{session_id}/results", get(get_results))
        .route("/{session_id}/leave", post(leave_game))
        .with_state(state)
}

async fn create_single_player(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let name = request.validate()?;
    let response = state
        .get_quiz_service()
        .create_single_player(&name, request.settings)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn create_multiplayer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let name = request.validate()?;
    let response = state
        .get_quiz_service()
        .create_multiplayer(&name, request.settings)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn join_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let name = request.validate()?;
    let response = state
        .get_quiz_service()
        .join(&request.room_code, &name)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

async fn start_game(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let response = state
        .get_quiz_service()
        .start_game(&session_id, &request.player_id)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ServerError> {
    request.validate()?;
    let service = state.get_quiz_service();

    let is_multiplayer = service
        .store()
        .get(&session_id)
        .await?
        .map(|session| session.is_multiplayer)
        .ok_or_else(|| ServerError::NotFound(format!("Session {} does not exist", session_id)))?;

    debug!(
        "Answer for session {} (multiplayer: {})",
        session_id, is_multiplayer
    );

    let response = match is_multiplayer {
        true => {
            let result = service
                .submit_multiplayer_answer(
                    &session_id,
                    &request.player_id,
                    &request.question_id,
                    request.selected_index,
                    request.time_remaining,
                )
                .await?;
            serde_json::to_value(result)?
        }
        false => {
            let result = service
                .submit_answer(
                    &session_id,
                    &request.player_id,
                    &request.question_id,
                    request.selected_index,
                    request.time_remaining,
                )
                .await?;
            serde_json::to_value(result)?
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let response = state
        .get_quiz_service()
        .advance_as_host(&session_id, &request.player_id)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

async fn get_state(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<StateQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let response = state
        .get_quiz_service()
        .get_state(&session_id, &query.player_id)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let response = state.get_quiz_service().get_results(&session_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

async fn leave_game(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let players = state
        .get_quiz_service()
        .remove_player(&session_id, &request.player_id)
        .await?;

    Ok((StatusCode::OK, Json(players)))
}
