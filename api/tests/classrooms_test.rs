mod helpers;

use api::auth::generate_jwt;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use db::models::{attendance_record, attendance_session, classroom, enrollment, user};
use serde_json::json;
use tower::ServiceExt;

use helpers::{body_json, make_test_app};

fn request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));
    match body {
        Some(v) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn create_list_and_archive_a_classroom() {
    let (app, db) = make_test_app().await;
    let grace = user::Model::create(&db, "grace@example.com", "Grace").await.unwrap();
    let (token, _) = generate_jwt(grace.id);

    // Create: the instructor gets the join code back.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classrooms",
            &token,
            Some(json!({ "name": "Systems 301", "term": "Fall 2026" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["data"]["role"], "instructor");
    let classroom_id = created["data"]["id"].as_i64().unwrap();
    let join_code = created["data"]["join_code"].as_str().unwrap().to_owned();
    assert_eq!(join_code.len(), 6);

    // Listed with the instructor role.
    let resp = app
        .clone()
        .oneshot(request("GET", "/api/classrooms", &token, None))
        .await
        .unwrap();
    let listed = body_json(resp).await;
    let rooms = listed["data"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], classroom_id);
    assert_eq!(rooms[0]["instructor_name"], "Grace");

    // Archive, then the listing is empty and the join code is dead.
    let uri = format!("/api/classrooms/{classroom_id}");
    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(request("GET", "/api/classrooms", &token, None))
        .await
        .unwrap();
    let listed = body_json(resp).await;
    assert!(listed["data"].as_array().unwrap().is_empty());

    let ada = user::Model::create(&db, "ada@example.com", "Ada").await.unwrap();
    let (ada_token, _) = generate_jwt(ada.id);
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classrooms/join",
            &ada_token,
            Some(json!({ "code": join_code })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn joining_with_a_code_enrolls_once() {
    let (app, db) = make_test_app().await;
    let grace = user::Model::create(&db, "grace@example.com", "Grace").await.unwrap();
    let ada = user::Model::create(&db, "ada@example.com", "Ada").await.unwrap();
    let room = db::models::classroom::Model::create(&db, "Systems 301", None, None, grace.id)
        .await
        .unwrap();

    let (token, _) = generate_jwt(ada.id);
    let body = json!({
        "code": room.join_code,
        "student_number": "u100",
        "major": "CS",
        "graduation_year": 2028
    });

    let resp = app
        .clone()
        .oneshot(request("POST", "/api/classrooms/join", &token, Some(body.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let joined = body_json(resp).await;
    assert_eq!(joined["data"]["role"], "student");
    // Students never see the join code.
    assert!(joined["data"]["join_code"].is_null());
    assert_eq!(joined["data"]["instructor_name"], "Grace");

    // Joining again is rejected.
    let resp = app
        .clone()
        .oneshot(request("POST", "/api/classrooms/join", &token, Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let repeat = body_json(resp).await;
    assert_eq!(repeat["message"], "already enrolled in this classroom");

    // Unknown codes are a 404.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classrooms/join",
            &token,
            Some(json!({ "code": "NOPE99" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn roster_management_is_instructor_only() {
    let (app, db) = make_test_app().await;
    let grace = user::Model::create(&db, "grace@example.com", "Grace").await.unwrap();
    let room = db::models::classroom::Model::create(&db, "Systems 301", None, None, grace.id)
        .await
        .unwrap();

    let (token, _) = generate_jwt(grace.id);
    let uri = format!("/api/classrooms/{}/roster", room.id);

    // Instructor adds a student by email; the user row is created on demand.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &token,
            Some(json!({
                "email": "bob@example.com",
                "name": "Bob",
                "student_number": "u200",
                "major": "Physics"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let added = body_json(resp).await;
    assert_eq!(added["data"]["name"], "Bob");
    assert_eq!(added["data"]["student_number"], "u200");

    // Duplicate student numbers within the classroom are rejected.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            &uri,
            &token,
            Some(json!({
                "email": "cam@example.com",
                "name": "Cam",
                "student_number": "u200"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // The roster lists the one successful enrollment.
    let resp = app
        .clone()
        .oneshot(request("GET", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let roster = body_json(resp).await;
    assert_eq!(roster["data"].as_array().unwrap().len(), 1);

    // Students cannot read or mutate the roster.
    let bob = user::Model::find_by_email(&db, "bob@example.com")
        .await
        .unwrap()
        .unwrap();
    let (bob_token, _) = generate_jwt(bob.id);
    let resp = app
        .clone()
        .oneshot(request("GET", &uri, &bob_token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn removing_a_student_keeps_their_records() {
    let (app, db) = make_test_app().await;
    let grace = user::Model::create(&db, "grace@example.com", "Grace").await.unwrap();
    let room = classroom::Model::create(&db, "Systems 301", None, None, grace.id)
        .await
        .unwrap();
    let ada = user::Model::create(&db, "ada@example.com", "Ada").await.unwrap();
    enrollment::Model::enroll(&db, room.id, ada.id, Some("u100"), None, None)
        .await
        .unwrap();
    let session = attendance_session::Model::create(&db, room.id, grace.id, Some("X7K2"))
        .await
        .unwrap();
    attendance_record::Model::check_in(&db, session.id, ada.id, "X7K2")
        .await
        .unwrap();

    let (token, _) = generate_jwt(grace.id);
    let uri = format!("/api/classrooms/{}/roster/{}", room.id, ada.id);

    // Students cannot remove anyone, including themselves.
    let (ada_token, _) = generate_jwt(ada.id);
    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &ada_token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The roster is empty, but the attendance record survives.
    let roster_uri = format!("/api/classrooms/{}/roster", room.id);
    let resp = app
        .clone()
        .oneshot(request("GET", &roster_uri, &token, None))
        .await
        .unwrap();
    let roster = body_json(resp).await;
    assert!(roster["data"].as_array().unwrap().is_empty());
    assert_eq!(
        attendance_record::Model::count_for_session(&db, session.id)
            .await
            .unwrap(),
        1
    );

    // Removing again is a no-op; a user id with no row is a 404.
    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let uri = format!("/api/classrooms/{}/roster/999", room.id);
    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn classroom_creation_is_validated_and_authenticated() {
    let (app, db) = make_test_app().await;
    let grace = user::Model::create(&db, "grace@example.com", "Grace").await.unwrap();
    let (token, _) = generate_jwt(grace.id);

    // Empty name fails validation.
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/classrooms",
            &token,
            Some(json!({ "name": "" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // No token at all.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/classrooms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
