//! Shared helpers for route handlers.

use axum::{Json, http::StatusCode};
use db::error::AttendanceError;
use serde::Serialize;

use crate::response::ApiResponse;

/// Maps a domain error onto the response envelope.
///
/// Validation rejections (`SessionClosed`, `CodeMismatch`, enrollment
/// conflicts) come back as 400 with the domain message; not-found and
/// authorization failures keep their own statuses; anything internal is
/// logged and answered generically.
pub fn error_response<T>(e: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize + Default,
{
    let status = match &e {
        AttendanceError::ClassroomNotFound
        | AttendanceError::SessionNotFound
        | AttendanceError::StudentNotFound => StatusCode::NOT_FOUND,
        AttendanceError::NotEnrolled => StatusCode::FORBIDDEN,
        AttendanceError::AlreadyEnrolled
        | AttendanceError::DuplicateStudentNumber
        | AttendanceError::SessionClosed
        | AttendanceError::CodeMismatch => StatusCode::BAD_REQUEST,
        AttendanceError::CodeSpaceExhausted | AttendanceError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "request failed");
        return (status, Json(ApiResponse::error("Internal server error")));
    }

    (status, Json(ApiResponse::error(e.to_string())))
}
