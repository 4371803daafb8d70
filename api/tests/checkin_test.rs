mod helpers;

use api::auth::generate_jwt;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use db::models::{attendance_record, attendance_session, classroom, enrollment, user};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tower::ServiceExt;

use helpers::{body_json, make_test_app};

struct TestCtx {
    instructor: user::Model,
    ada: user::Model,
    bob: user::Model,
    cam: user::Model,
    classroom: classroom::Model,
}

async fn setup(db: &DatabaseConnection) -> TestCtx {
    let instructor = user::Model::create(db, "grace@example.com", "Grace")
        .await
        .unwrap();
    let classroom = classroom::Model::create(db, "Systems 301", None, None, instructor.id)
        .await
        .unwrap();

    let ada = user::Model::create(db, "ada@example.com", "Ada").await.unwrap();
    let bob = user::Model::create(db, "bob@example.com", "Bob").await.unwrap();
    let cam = user::Model::create(db, "cam@example.com", "Cam").await.unwrap();
    for student in [&ada, &bob, &cam] {
        enrollment::Model::enroll(db, classroom.id, student.id, None, None, None)
            .await
            .unwrap();
    }

    TestCtx {
        instructor,
        ada,
        bob,
        cam,
        classroom,
    }
}

fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn full_checkin_scenario_over_http() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;

    let (instructor_token, _) = generate_jwt(ctx.instructor.id);
    let (ada_token, _) = generate_jwt(ctx.ada.id);
    let (cam_token, _) = generate_jwt(ctx.cam.id);

    // Instructor opens a session and receives its code.
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions",
        ctx.classroom.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&uri, &instructor_token, json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["is_open"], true);
    let session_id = created["data"]["id"].as_i64().unwrap();
    let code = created["data"]["code"].as_str().unwrap().to_owned();
    assert_eq!(code.len(), 4);

    // Ada checks in with the code.
    let checkin_uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        ctx.classroom.id, session_id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&checkin_uri, &ada_token, json!({ "code": code })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let first = body_json(resp).await;
    assert_eq!(first["data"]["status"], "present");
    assert_eq!(first["data"]["provenance"], "self_checkin");
    assert_eq!(first["data"]["newly_recorded"], true);

    // Ada submits again: still success, nothing duplicated, same timestamp.
    let resp = app
        .clone()
        .oneshot(post_json(&checkin_uri, &ada_token, json!({ "code": code })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let repeat = body_json(resp).await;
    assert_eq!(repeat["message"], "Already checked in");
    assert_eq!(repeat["data"]["newly_recorded"], false);
    assert_eq!(repeat["data"]["taken_at"], first["data"]["taken_at"]);
    assert_eq!(
        attendance_record::Model::count_for_session(&db, session_id)
            .await
            .unwrap(),
        1
    );

    // Instructor marks Bob present by hand.
    let manual_uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/manual-checkin",
        ctx.classroom.id, session_id
    );
    let resp = app
        .clone()
        .oneshot(post_json(
            &manual_uri,
            &instructor_token,
            json!({ "student_id": ctx.bob.id }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let manual = body_json(resp).await;
    assert_eq!(manual["data"]["provenance"], "manual");

    // Instructor closes the session.
    let patch_uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}",
        ctx.classroom.id, session_id
    );
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(&patch_uri)
                .header("Authorization", format!("Bearer {instructor_token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "is_open": false }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Cam's correct code now bounces off the closed session, with no record.
    let resp = app
        .clone()
        .oneshot(post_json(&checkin_uri, &cam_token, json!({ "code": code })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let rejected = body_json(resp).await;
    assert_eq!(rejected["success"], false);
    assert_eq!(rejected["message"], "attendance session is closed");
    assert_eq!(
        attendance_record::Model::count_for_session(&db, session_id)
            .await
            .unwrap(),
        2
    );

    // The reconciled detail view reports Ada and Bob present, Cam absent.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(&patch_uri)
                .header("Authorization", format!("Bearer {instructor_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let detail = body_json(resp).await;
    let entries = detail["data"]["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let entry_for = |name: &str| {
        entries
            .iter()
            .find(|e| e["name"] == name)
            .unwrap_or_else(|| panic!("no roster entry for {name}"))
    };
    assert_eq!(entry_for("Ada")["status"], "present");
    assert_eq!(entry_for("Ada")["provenance"], "self_checkin");
    assert_eq!(entry_for("Bob")["status"], "present");
    assert_eq!(entry_for("Bob")["provenance"], "manual");
    assert_eq!(entry_for("Cam")["status"], "absent");
    assert!(entry_for("Cam")["checked_in_at"].is_null());
}

#[tokio::test]
async fn wrong_code_is_a_bad_request() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session =
        attendance_session::Model::create(&db, ctx.classroom.id, ctx.instructor.id, Some("X7K2"))
            .await
            .unwrap();

    let (ada_token, _) = generate_jwt(ctx.ada.id);
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        ctx.classroom.id, session.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&uri, &ada_token, json!({ "code": "Z9Z9" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "invalid check-in code");
    assert_eq!(
        attendance_record::Model::count_for_session(&db, session.id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn non_enrolled_callers_are_forbidden() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let stranger = user::Model::create(&db, "eve@example.com", "Eve").await.unwrap();
    let session =
        attendance_session::Model::create(&db, ctx.classroom.id, ctx.instructor.id, Some("X7K2"))
            .await
            .unwrap();

    let (stranger_token, _) = generate_jwt(stranger.id);
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        ctx.classroom.id, session.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&uri, &stranger_token, json!({ "code": "X7K2" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Manual marking of a non-enrolled user is rejected the same way.
    let (instructor_token, _) = generate_jwt(ctx.instructor.id);
    let manual_uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/manual-checkin",
        ctx.classroom.id, session.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(
            &manual_uri,
            &instructor_token,
            json!({ "student_id": stranger.id }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // A student id with no user row behind it is a 404, not a 403.
    let resp = app
        .clone()
        .oneshot(post_json(
            &manual_uri,
            &instructor_token,
            json!({ "student_id": 999 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "student not found");
}

#[tokio::test]
async fn sessions_are_scoped_to_their_classroom_path() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session =
        attendance_session::Model::create(&db, ctx.classroom.id, ctx.instructor.id, Some("X7K2"))
            .await
            .unwrap();

    // A second classroom owned by the same instructor; its URL must not
    // reach the first classroom's session.
    let other = classroom::Model::create(&db, "Other 101", None, None, ctx.instructor.id)
        .await
        .unwrap();
    enrollment::Model::enroll(&db, other.id, ctx.ada.id, None, None, None)
        .await
        .unwrap();

    let (ada_token, _) = generate_jwt(ctx.ada.id);
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        other.id, session.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&uri, &ada_token, json!({ "code": "X7K2" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Unknown session ids are a plain 404.
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/999/checkin",
        ctx.classroom.id
    );
    let resp = app
        .clone()
        .oneshot(post_json(&uri, &ada_token, json!({ "code": "X7K2" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reopened_sessions_accept_checkins_without_duplicates() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session =
        attendance_session::Model::create(&db, ctx.classroom.id, ctx.instructor.id, Some("X7K2"))
            .await
            .unwrap();

    attendance_record::Model::check_in(&db, session.id, ctx.ada.id, "X7K2")
        .await
        .unwrap();
    attendance_session::Model::set_open(&db, session.id, false)
        .await
        .unwrap();
    attendance_session::Model::set_open(&db, session.id, true)
        .await
        .unwrap();

    let (ada_token, _) = generate_jwt(ctx.ada.id);
    let (bob_token, _) = generate_jwt(ctx.bob.id);
    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        ctx.classroom.id, session.id
    );

    let resp = app
        .clone()
        .oneshot(post_json(&uri, &ada_token, json!({ "code": "X7K2" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["newly_recorded"], false);

    let resp = app
        .clone()
        .oneshot(post_json(&uri, &bob_token, json!({ "code": "X7K2" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(
        attendance_record::Model::count_for_session(&db, session.id)
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn checkin_requires_authentication() {
    let (app, db) = make_test_app().await;
    let ctx = setup(&db).await;
    let session =
        attendance_session::Model::create(&db, ctx.classroom.id, ctx.instructor.id, Some("X7K2"))
            .await
            .unwrap();

    let uri = format!(
        "/api/classrooms/{}/attendance/sessions/{}/checkin",
        ctx.classroom.id, session.id
    );
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&uri)
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "code": "X7K2" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
