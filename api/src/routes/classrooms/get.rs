use std::collections::HashMap;

use axum::{Extension, Json, extract::Path, extract::State, http::StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use db::models::{classroom, enrollment, user};
use util::state::AppState;

use crate::routes::common::error_response;
use crate::{auth::AuthUser, response::ApiResponse};

use super::common::{ClassroomResponse, RosterEntryResponse};

/// GET /api/classrooms
///
/// Lists the active classrooms the caller teaches (with join code) and
/// attends (without), newest first within each role.
pub async fn list_classrooms(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<ClassroomResponse>>>) {
    let db = state.db();

    let taught = match classroom::Model::find_taught_by(db, claims.sub).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e.into()),
    };
    let attended = match classroom::Model::find_attended_by(db, claims.sub).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e.into()),
    };

    // One lookup for every instructor name the listing needs.
    let mut instructor_ids: Vec<i64> = attended.iter().map(|c| c.instructor_id).collect();
    instructor_ids.push(claims.sub);
    let names: HashMap<i64, String> = match user::Entity::find()
        .filter(user::Column::Id.is_in(instructor_ids))
        .all(db)
        .await
    {
        Ok(rows) => rows.into_iter().map(|u| (u.id, u.name)).collect(),
        Err(e) => return error_response(e.into()),
    };

    let mut out: Vec<ClassroomResponse> = Vec::with_capacity(taught.len() + attended.len());
    for room in taught {
        let name = names.get(&room.instructor_id).cloned();
        out.push(ClassroomResponse::for_instructor(room, name));
    }
    for room in attended {
        let name = names.get(&room.instructor_id).cloned();
        out.push(ClassroomResponse::for_student(room, name));
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(out, "Classrooms retrieved")),
    )
}

/// GET /api/classrooms/{classroom_id}/roster
///
/// Instructor-only: the full roster with enrollment demographics, ordered by
/// student name.
pub async fn get_roster(
    State(state): State<AppState>,
    Path(classroom_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<RosterEntryResponse>>>) {
    let db = state.db();

    match enrollment::Model::roster(db, classroom_id).await {
        Ok(rows) => {
            let entries = rows
                .into_iter()
                .map(|(enrollment, student)| RosterEntryResponse::from_parts(enrollment, student))
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(entries, "Roster retrieved")),
            )
        }
        Err(e) => error_response(e.into()),
    }
}
