use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::entity::AlertStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot {action} alert {alert_id}: alert is {from}")]
    InvalidStateTransition {
        alert_id: Uuid,
        from: &'static str,
        action: &'static str,
    },

    #[error("Device API error: {0}")]
    DeviceApi(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub(crate) fn invalid_transition(alert_id: Uuid, from: AlertStatus, action: &'static str) -> Self {
        Self::InvalidStateTransition {
            alert_id,
            from: from.as_str(),
            action,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            Self::DeviceApi(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {e:?}");
                "Database error".to_string()
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                "Configuration error".to_string()
            }
            Self::DeviceApi(msg) => {
                tracing::error!("Device API error: {msg}");
                self.to_string()
            }
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            Self::InvalidStateTransition { .. } => self.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
