use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Every way a request can fail. Handlers return `Result<_, ApiError>` and
/// the conversion to a response happens in one place.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email or category name.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Missing/invalid/expired token, role mismatch, ownership mismatch.
    #[error("{0}")]
    Unauthorized(String),

    /// Request body over the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Store or filesystem failure. The cause is logged, never sent.
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Attached to error responses so the `render_errors` middleware can add
/// the debug detail outside production.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub stack: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stack(&self) -> String {
        match self {
            // anyhow's Debug prints the whole cause chain.
            Self::Internal(e) => format!("{:?}", e),
            other => format!("{:?}", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) => error!("Request failed: {:?}", e),
            Self::Unauthorized(msg) => warn!("Unauthorized: {}", msg),
            _ => {}
        }

        let report = ErrorReport {
            message: self.to_string(),
            stack: self.stack(),
        };
        let mut response = (status, Json(json!({ "message": report.message }))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl ApiError {
    /// Extractor failures are client errors; only a body over the size
    /// limit keeps its own status.
    fn rejected(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(message)
        } else {
            Self::Validation(message)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::rejected(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_oversized_bodies_keep_their_status() {
        let err = ApiError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".into());
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));
        let err = ApiError::rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad type".into());
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn internal_details_stay_in_the_report() {
        let response = ApiError::from(anyhow::anyhow!("disk on fire")).into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.message, "Internal server error");
        assert!(report.stack.contains("disk on fire"));
    }
}
