use axum::{Extension, Json, extract::Path, extract::State, http::StatusCode};

use db::error::AttendanceError;
use db::models::{attendance_record, attendance_session, classroom, enrollment};
use db::stats::{self, ClassroomStats};
use sea_orm::EntityTrait;
use util::state::AppState;

use crate::routes::common::error_response;
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{ReconciledEntry, SessionDetailResponse, SessionResponse};

/// GET /api/classrooms/{classroom_id}/attendance/sessions
///
/// Lists the classroom's sessions, newest first, enriched with attendance
/// counts and whether the caller has checked in. The code is included only
/// when the caller is the instructor.
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<SessionResponse>>>) {
    let db = state.db();

    let is_instructor = match classroom::Model::is_instructor(db, classroom_id, claims.sub).await {
        Ok(answer) => answer,
        Err(e) => return error_response(e.into()),
    };

    let rows = match attendance_session::Model::list_for_classroom(db, classroom_id).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e.into()),
    };

    let enrolled = match enrollment::Model::count_for_classroom(db, classroom_id).await {
        Ok(n) => n as i64,
        Err(e) => return error_response(e.into()),
    };

    let session_ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
    let attended = match attendance_record::Model::counts_for_sessions(db, &session_ids).await {
        Ok(map) => map,
        Err(e) => return error_response(e.into()),
    };
    let mine = match attendance_record::Model::sessions_attended_by(db, &session_ids, claims.sub)
        .await
    {
        Ok(set) => set,
        Err(e) => return error_response(e.into()),
    };

    let sessions = rows
        .into_iter()
        .map(|s| {
            let id = s.id;
            SessionResponse::new(s, is_instructor)
                .with_counts(*attended.get(&id).unwrap_or(&0), enrolled)
                .with_checked_in(mine.contains(&id))
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(sessions, "Attendance sessions retrieved")),
    )
}

/// GET /api/classrooms/{classroom_id}/attendance/sessions/{session_id}
///
/// Instructor-only: the session plus the roster-reconciled record list —
/// every enrolled student, present or absent.
pub async fn session_detail(
    State(state): State<AppState>,
    Path((classroom_id, session_id)): Path<(i64, i64)>,
) -> (StatusCode, Json<ApiResponse<SessionDetailResponse>>) {
    let db = state.db();

    let session = match attendance_session::Entity::find_by_id(session_id).one(db).await {
        Ok(Some(session)) if session.classroom_id == classroom_id => session,
        Ok(_) => return error_response(AttendanceError::SessionNotFound),
        Err(e) => return error_response(e.into()),
    };

    let entries = match attendance_record::Model::reconcile(db, session_id).await {
        Ok(entries) => entries,
        Err(e) => return error_response(e),
    };

    let enrolled = entries.len() as i64;
    let attended = entries.iter().filter(|e| e.record.is_some()).count() as i64;
    let entries: Vec<ReconciledEntry> = entries.into_iter().map(Into::into).collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            SessionDetailResponse {
                session: SessionResponse::new(session, true).with_counts(attended, enrolled),
                entries,
            },
            "Attendance session retrieved",
        )),
    )
}

/// GET /api/classrooms/{classroom_id}/attendance/statistics
///
/// Instructor-only: overall attendance rate plus demographic breakdowns of
/// the current roster.
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<ClassroomStats>>) {
    match stats::classroom_stats(state.db(), classroom_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(stats, "Statistics retrieved")),
        ),
        Err(e) => error_response(e),
    }
}
