use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use util::state::AppState;

pub mod attendance;
mod common;
mod delete;
mod get;
mod post;

use crate::auth::guards::allow_classroom_instructor;
use attendance::attendance_routes;
pub use delete::{archive_classroom, remove_roster_entry};
pub use get::{get_roster, list_classrooms};
pub use post::{add_roster_entry, create_classroom, join_classroom};

pub fn classroom_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_classroom))
        .route("/", get(list_classrooms))
        .route("/join", post(join_classroom))
        .route(
            "/{classroom_id}",
            delete(archive_classroom).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/{classroom_id}/roster",
            get(get_roster).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/{classroom_id}/roster",
            post(add_roster_entry).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .route(
            "/{classroom_id}/roster/{student_id}",
            delete(remove_roster_entry).route_layer(from_fn_with_state(
                app_state.clone(),
                allow_classroom_instructor,
            )),
        )
        .nest(
            "/{classroom_id}/attendance",
            attendance_routes(app_state.clone()),
        )
}
