use axum::{Json, extract::Path, extract::State, http::StatusCode};

use db::models::{classroom, enrollment};
use util::state::AppState;

use crate::response::ApiResponse;
use crate::routes::common::error_response;

use super::common::ClassroomResponse;

/// DELETE /api/classrooms/{classroom_id}
///
/// Instructor-only soft archive: the classroom stops accepting joins and
/// drops out of listings, but sessions and records stay intact. Archiving an
/// archived classroom is a no-op.
pub async fn archive_classroom(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<ClassroomResponse>>) {
    match classroom::Model::archive(state.db(), classroom_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ClassroomResponse::for_instructor(row, None),
                "Classroom archived",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/classrooms/{classroom_id}/roster/{student_id}
///
/// Instructor-only: removes a student from the roster. Their attendance
/// records are kept, but they drop out of reconciled views and statistics.
/// Removing someone who is not on the roster is a no-op.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` for an unknown student id
pub async fn remove_roster_entry(
    State(state): State<AppState>,
    Path((classroom_id, student_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match enrollment::Model::unenroll(state.db(), classroom_id, student_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "Student removed from roster")),
        ),
        Err(e) => error_response(e),
    }
}
