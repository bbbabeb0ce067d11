//! JSON response envelope: `{success, data?, message?, error?}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::repository::RepositoryError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 200 with `data` and an optional message.
pub fn ok<T: Serialize>(data: T, message: Option<&str>) -> Response {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: message.map(str::to_string),
        error: None,
    })
    .into_response()
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(msg) => Self::BadRequest(msg),
            RepositoryError::NotFound(msg) => Self::NotFound(msg),
            other => {
                error!("Storage error: {}", other);
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Blocking task failed: {}", err);
        Self::Internal("internal task failure".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::Internal(m) => m,
        };
        let body = Envelope::<()> {
            success: false,
            data: None,
            message: None,
            error: Some(msg),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult = Result<Response, ApiError>;
