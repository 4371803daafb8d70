//! Route-layer access guards.
//!
//! Authorization is a stateless per-request check: each guard reads the
//! `classroom_id` path parameter, asks the database who the caller is in that
//! classroom, and denies on any doubt. Guards insert the extracted `AuthUser`
//! into request extensions for the handler.

use std::collections::HashMap;

use axum::{
    Json,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::{classroom, enrollment};
use util::state::AppState;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Extracts and validates the caller from the request, re-inserting the
/// `AuthUser` into request extensions for downstream handlers.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

fn classroom_id_from(
    params: &HashMap<String, String>,
) -> Result<i64, (StatusCode, Json<ApiResponse<Empty>>)> {
    params
        .get("classroom_id")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Missing or invalid classroom_id")),
        ))
}

/// Basic guard: the request must carry a valid token.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_authuser(req).await?;

    Ok(next.run(req).await)
}

/// Instructor-only guard: the caller must own the classroom in the path.
pub async fn allow_classroom_instructor(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let classroom_id = classroom_id_from(&params)?;

    match classroom::Model::is_instructor(app_state.db(), classroom_id, user.0.sub).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Instructor access required")),
        )),
        Err(e) => {
            // Deny on DB error (fail-safe).
            tracing::warn!(
                error = %e,
                user_id = user.0.sub,
                classroom_id,
                "DB error while checking instructor; denying access"
            );
            Err((
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("Instructor access required")),
            ))
        }
    }
}

/// Membership guard: the caller must teach or attend the classroom.
pub async fn allow_classroom_member(
    State(app_state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;
    let classroom_id = classroom_id_from(&params)?;
    let db = app_state.db();

    let is_member = match classroom::Model::is_instructor(db, classroom_id, user.0.sub).await {
        Ok(true) => true,
        Ok(false) => enrollment::Model::is_enrolled(db, classroom_id, user.0.sub)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(
                    error = %e,
                    user_id = user.0.sub,
                    classroom_id,
                    "DB error while checking enrollment; denying access"
                );
                false
            }),
        Err(e) => {
            tracing::warn!(
                error = %e,
                user_id = user.0.sub,
                classroom_id,
                "DB error while checking instructor; denying access"
            );
            false
        }
    };

    if is_member {
        Ok(next.run(req).await)
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Classroom membership required")),
        ))
    }
}
