//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → health probe (public)
//! - `/classrooms` → classroom, roster, and attendance endpoints
//!   (authenticated users; instructor-only mutations guarded per route)

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use crate::routes::{classrooms::classroom_routes, health::health_routes};

pub mod classrooms;
pub mod common;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
///
/// The returned router is fully stated and ready to be nested under `/api`.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/classrooms",
            classroom_routes(app_state.clone()).route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
