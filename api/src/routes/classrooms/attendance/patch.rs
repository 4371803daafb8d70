use axum::{Json, extract::Path, extract::State, http::StatusCode};

use db::models::attendance_session;
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::error_response;

use super::common::{SessionResponse, SetSessionStateReq};
use super::post::load_session_in_classroom;

/// PATCH /api/classrooms/{classroom_id}/attendance/sessions/{session_id}
///
/// Instructor-only open/close flip. Applying the current state again is a
/// no-op. Closing keeps the code for historical display; reopening re-enables
/// check-in with the stored code unless it now collides with another open
/// session, in which case a fresh one is minted.
///
/// ### Responses
/// - `200 OK` with the updated session
/// - `404 Not Found` for an unknown session
pub async fn set_session_state(
    State(state): State<AppState>,
    Path((classroom_id, session_id)): Path<(i64, i64)>,
    Json(body): Json<SetSessionStateReq>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();
    match load_session_in_classroom(db, classroom_id, session_id).await {
        Ok(()) => {}
        Err(e) => return error_response(e),
    }

    match attendance_session::Model::set_open(db, session_id, body.is_open).await {
        Ok(row) => {
            let message = if row.is_open {
                "Attendance session opened"
            } else {
                "Attendance session closed"
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(SessionResponse::new(row, true), message)),
            )
        }
        Err(e) => error_response(e),
    }
}
