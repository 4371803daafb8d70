use axum::{Extension, Json, extract::Path, extract::State, http::StatusCode};
use validator::Validate;

use db::error::AttendanceError;
use db::models::{attendance_record, attendance_session, enrollment};
use util::state::AppState;

use crate::routes::common::error_response;
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{CheckinReq, CheckinResponse, ManualCheckinReq, SessionResponse};

/// POST /api/classrooms/{classroom_id}/attendance/sessions
///
/// Instructor-only: opens a new attendance session with a fresh check-in
/// code, guaranteed not to collide with any other open session's code in the
/// classroom.
///
/// ### Responses
/// - `201 Created` with the session (code included)
pub async fn create_session(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let db = state.db();

    match attendance_session::Model::create(db, classroom_id, claims.sub, None).await {
        Ok(row) => {
            let enrolled = enrollment::Model::count_for_classroom(db, classroom_id)
                .await
                .unwrap_or(0);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    SessionResponse::new(row, true).with_counts(0, enrolled as i64),
                    "Attendance session created",
                )),
            )
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/classrooms/{classroom_id}/attendance/sessions/{session_id}/checkin
///
/// Student self-service check-in with the session code. A repeat submission
/// succeeds without writing anything and returns the original timestamp.
///
/// ### Responses
/// - `200 OK` on success (fresh or repeated)
/// - `400 Bad Request` for a wrong code or a closed session
/// - `403 Forbidden` when the caller is not enrolled
/// - `404 Not Found` for an unknown session
pub async fn checkin(
    State(state): State<AppState>,
    Path((classroom_id, session_id)): Path<(i64, i64)>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CheckinReq>,
) -> (StatusCode, Json<ApiResponse<CheckinResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }

    let db = state.db();
    match load_session_in_classroom(db, classroom_id, session_id).await {
        Ok(()) => {}
        Err(e) => return error_response(e),
    }

    match attendance_record::Model::check_in(db, session_id, claims.sub, &body.code).await {
        Ok(outcome) => {
            let message = if outcome.newly_recorded {
                "Checked in"
            } else {
                "Already checked in"
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(CheckinResponse::from(outcome), message)),
            )
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/classrooms/{classroom_id}/attendance/sessions/{session_id}/manual-checkin
///
/// Instructor-only: marks an enrolled student present without a code,
/// regardless of session state. Marking an already-present student is a
/// no-op success.
///
/// ### Responses
/// - `200 OK` with the record (provenance `manual` unless one already existed)
/// - `403 Forbidden` when the target student is not enrolled
/// - `404 Not Found` for an unknown session
pub async fn manual_checkin(
    State(state): State<AppState>,
    Path((classroom_id, session_id)): Path<(i64, i64)>,
    Json(body): Json<ManualCheckinReq>,
) -> (StatusCode, Json<ApiResponse<CheckinResponse>>) {
    let db = state.db();
    match load_session_in_classroom(db, classroom_id, session_id).await {
        Ok(()) => {}
        Err(e) => return error_response(e),
    }

    match attendance_record::Model::mark_manual(db, session_id, body.student_id).await {
        Ok(outcome) => {
            let message = if outcome.newly_recorded {
                "Student marked present"
            } else {
                "Already checked in"
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(CheckinResponse::from(outcome), message)),
            )
        }
        Err(e) => error_response(e),
    }
}

/// Confirms the session exists and belongs to the classroom in the path, so
/// a session id cannot be reached through another classroom's URL.
pub(super) async fn load_session_in_classroom(
    db: &sea_orm::DatabaseConnection,
    classroom_id: i64,
    session_id: i64,
) -> Result<(), AttendanceError> {
    use sea_orm::EntityTrait;

    match attendance_session::Entity::find_by_id(session_id).one(db).await? {
        Some(session) if session.classroom_id == classroom_id => Ok(()),
        _ => Err(AttendanceError::SessionNotFound),
    }
}
