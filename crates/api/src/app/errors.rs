use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use cowork_core::{Error, ErrorCategory, Failure};

const REDACTED_MESSAGE: &str = "an internal error occurred";

/// HTTP status for an error category.
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn is_internal(category: ErrorCategory) -> bool {
    matches!(category, ErrorCategory::Unexpected | ErrorCategory::Exception)
}

fn public_message(error: &Error) -> &str {
    if is_internal(error.category()) {
        REDACTED_MESSAGE
    } else {
        error.message()
    }
}

/// Render a failed outcome. The first error picks the status and the
/// top-level code; every error is listed under `errors`.
pub fn failure_to_response(failure: Failure) -> Response {
    let first = failure.first();
    let status = status_for(first.category());
    if status.is_server_error() {
        tracing::error!(code = first.code(), message = first.message(), "request failed");
    }

    let errors: Vec<_> = failure
        .errors()
        .iter()
        .map(|e| {
            json!({
                "code": e.code(),
                "message": public_message(e),
                "category": e.category().as_str(),
            })
        })
        .collect();

    (
        status,
        axum::Json(json!({
            "error": first.code(),
            "message": public_message(first),
            "errors": errors,
        })),
    )
        .into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "errors": [],
        })),
    )
        .into_response()
}

pub fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "Request.InvalidBody", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "Request.InvalidQuery", rejection.body_text())
}
