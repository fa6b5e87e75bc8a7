use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{
    key_vault::key_vault::KeyVaultError, quiz::generator::GeneratorError,
    session::store::StoreError,
};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    Exhausted(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Session is busy, try again")]
    Busy,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Failed to serialize object: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ServerError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "not_found",
            ServerError::Forbidden(_) => "forbidden",
            ServerError::Conflict(_) => "conflict",
            ServerError::Precondition(_) => "precondition_failed",
            ServerError::Exhausted(_) => "resource_exhausted",
            ServerError::Validation(_) => "validation",
            ServerError::Busy => "busy",
            ServerError::Internal(_) | ServerError::Serialize(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::Conflict(_)
            | ServerError::Precondition(_)
            | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Exhausted(_) | ServerError::Internal(_) | ServerError::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => {
                ServerError::NotFound(format!("Session {} does not exist", id))
            }
            StoreError::AlreadyExists(id) => {
                ServerError::Internal(format!("Session {} already exists", id))
            }
            StoreError::LockTimeout(_) => ServerError::Busy,
        }
    }
}

impl From<KeyVaultError> for ServerError {
    fn from(value: KeyVaultError) -> Self {
        match value {
            KeyVaultError::FullCapacity => ServerError::Exhausted(value.to_string()),
        }
    }
}

impl From<GeneratorError> for ServerError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::InsufficientData { .. } => ServerError::Exhausted(value.to_string()),
            GeneratorError::Provider(_) => ServerError::Internal(value.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        }

        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
