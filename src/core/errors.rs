use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Terminal failure of one pipeline stage. The first error aborts the
/// invocation; nothing is retried internally.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document unavailable: {0}")]
    DocumentUnavailable(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("index build failed: {0}")]
    IndexBuildFailed(String),
    #[error("history unavailable: {0}")]
    HistoryUnavailable(String),
    #[error("generation failed: {0}")]
    GenerationFailed(String),
}

impl PipelineError {
    pub fn document<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::DocumentUnavailable(err.to_string())
    }

    pub fn extraction<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::ExtractionFailed(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::IndexBuildFailed(err.to_string())
    }

    pub fn history<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::HistoryUnavailable(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::GenerationFailed(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::DocumentUnavailable(_) => "document_unavailable",
            PipelineError::ExtractionFailed(_) => "extraction_failed",
            PipelineError::IndexBuildFailed(_) => "index_build_failed",
            PipelineError::HistoryUnavailable(_) => "history_unavailable",
            PipelineError::GenerationFailed(_) => "generation_failed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PipelineError::DocumentUnavailable(_) => StatusCode::NOT_FOUND,
            PipelineError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::IndexBuildFailed(_) => StatusCode::BAD_GATEWAY,
            PipelineError::HistoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    /// Wrap any displayable error as a 500.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ApiError::Pipeline(err) => (
                err.status(),
                json!({ "error": err.to_string(), "kind": err.kind() }),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::LimitExceeded(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, json!({ "error": msg }))
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_kinds_are_stable() {
        let cases = [
            (PipelineError::document("gone"), "document_unavailable"),
            (PipelineError::extraction("bad bytes"), "extraction_failed"),
            (PipelineError::index("db down"), "index_build_failed"),
            (PipelineError::history("db down"), "history_unavailable"),
            (PipelineError::generation("timeout"), "generation_failed"),
        ];

        for (err, kind) in cases {
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn pipeline_error_converts_into_api_error() {
        let err: ApiError = PipelineError::document("missing blob").into();
        assert!(matches!(
            err,
            ApiError::Pipeline(PipelineError::DocumentUnavailable(_))
        ));
    }
}
