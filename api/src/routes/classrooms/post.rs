use axum::{Extension, Json, extract::Path, extract::State, http::StatusCode};
use sea_orm::EntityTrait;
use validator::Validate;

use db::error::AttendanceError;
use db::models::{classroom, enrollment, user};
use util::state::AppState;

use crate::routes::common::error_response;
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{
    AddRosterEntryReq, ClassroomResponse, CreateClassroomReq, JoinClassroomReq,
    RosterEntryResponse,
};

/// POST /api/classrooms
///
/// Creates a classroom owned by the caller, with a freshly minted join code.
///
/// ### Responses
/// - `201 Created` with the classroom (join code visible to its instructor)
/// - `400 Bad Request` on validation failure
pub async fn create_classroom(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<CreateClassroomReq>,
) -> (StatusCode, Json<ApiResponse<ClassroomResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }

    let db = state.db();
    match classroom::Model::create(
        db,
        &body.name,
        body.term.as_deref(),
        body.section.as_deref(),
        claims.sub,
    )
    .await
    {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                ClassroomResponse::for_instructor(row, None),
                "Classroom created",
            )),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/classrooms/join
///
/// Enrolls the caller in the active classroom matching the submitted join
/// code. Demographics are stored on the enrollment. Archived classrooms are
/// reported as not found, same as an unknown code.
///
/// ### Responses
/// - `200 OK` with the joined classroom (student view, no join code)
/// - `404 Not Found` for unknown or archived codes
/// - `400 Bad Request` when already enrolled or the student number is taken
pub async fn join_classroom(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(body): Json<JoinClassroomReq>,
) -> (StatusCode, Json<ApiResponse<ClassroomResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }

    let db = state.db();
    let room = match classroom::Model::find_active_by_join_code(db, &body.code).await {
        Ok(Some(room)) => room,
        Ok(None) => return error_response(AttendanceError::ClassroomNotFound),
        Err(e) => return error_response(e.into()),
    };

    if let Err(e) = enrollment::Model::enroll(
        db,
        room.id,
        claims.sub,
        body.student_number.as_deref(),
        body.major.as_deref(),
        body.graduation_year,
    )
    .await
    {
        return error_response(e);
    }

    let instructor_name = match user::Entity::find_by_id(room.instructor_id)
        .one(db)
        .await
    {
        Ok(instructor) => instructor.map(|u| u.name),
        Err(e) => return error_response(e.into()),
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ClassroomResponse::for_student(room, instructor_name),
            "Joined classroom",
        )),
    )
}

/// POST /api/classrooms/{classroom_id}/roster
///
/// Instructor-only: adds a student to the roster by email, creating the user
/// reference row when it does not exist yet.
///
/// ### Responses
/// - `201 Created` with the roster entry
/// - `400 Bad Request` when already enrolled or the student number is taken
pub async fn add_roster_entry(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
    Json(body): Json<AddRosterEntryReq>,
) -> (StatusCode, Json<ApiResponse<RosterEntryResponse>>) {
    if let Err(e) = body.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Validation failed: {e}"))),
        );
    }

    let db = state.db();
    let student = match user::Model::find_or_create_by_email(db, &body.email, &body.name).await {
        Ok(row) => row,
        Err(e) => return error_response(e.into()),
    };

    match enrollment::Model::enroll(
        db,
        classroom_id,
        student.id,
        body.student_number.as_deref(),
        body.major.as_deref(),
        body.graduation_year,
    )
    .await
    {
        Ok(enrollment) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                RosterEntryResponse::from_parts(enrollment, student),
                "Student added to roster",
            )),
        ),
        Err(e) => error_response(e),
    }
}
