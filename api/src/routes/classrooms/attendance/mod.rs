use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use util::state::AppState;

mod common;
mod get;
mod patch;
mod post;

pub use get::{get_statistics, list_sessions, session_detail};
pub use patch::set_session_state;
pub use post::{checkin, create_session, manual_checkin};

use crate::auth::guards::{allow_classroom_instructor, allow_classroom_member};

/// Attendance endpoints under `/api/classrooms/{classroom_id}/attendance`.
///
/// Check-in carries no membership guard on purpose: the validator's own
/// enrollment check distinguishes "not enrolled" from "not a member of this
/// classroom at all", which the guard cannot.
pub fn attendance_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/sessions",
            post(create_session).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/sessions",
            get(list_sessions).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_member,
            )),
        )
        .route(
            "/sessions/{session_id}",
            get(session_detail).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/sessions/{session_id}",
            patch(set_session_state).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route("/sessions/{session_id}/checkin", post(checkin))
        .route(
            "/sessions/{session_id}/manual-checkin",
            post(manual_checkin).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/statistics",
            get(get_statistics).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
}
