use api::routes::routes;
use axum::{Router, body::Body, http::Request, response::Response};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::convert::Infallible;
use tower::ServiceExt;
use tower::util::BoxCloneService;
use util::{config::AppConfig, state::AppState};

/// Builds the real router over a fresh migrated in-memory database.
///
/// Config overrides come first so JWT minting and verification agree on the
/// secret before any request is made.
pub async fn make_test_app() -> (
    BoxCloneService<Request<Body>, Response, Infallible>,
    DatabaseConnection,
) {
    AppConfig::set_jwt_secret("integration-test-secret");
    AppConfig::set_jwt_duration_minutes(30u64);

    let db = db::test_utils::setup_test_db().await;
    let app_state = AppState::new(db.clone());

    let router = Router::new().nest("/api", routes(app_state));
    (router.into_service().boxed_clone(), db)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
