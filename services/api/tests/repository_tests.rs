//! Repositories against canned backend responses

mod support;

use api::ApiClient;
use api::models::{
    CourseQuery, FileUpload, ImageRef, LoginCredentials, NewCourseType, NewUser, UserQuery,
    UserUpdate,
};
use api::session::SessionContext;
use axum::http::Method;
use common::error::ClientError;
use serde_json::json;

use support::{Canned, FakeBackend, signed_in_session};

fn api(backend: &FakeBackend, session: SessionContext) -> ApiClient {
    ApiClient::new(&backend.config(), session).expect("Failed to create API client")
}

#[tokio::test]
async fn test_login_sends_credentials_and_normalizes_response() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::POST,
        "/login",
        200,
        json!({"data": {"user": {"id": 7, "email": "admin@example.com"}, "access_token": "t-7"}}),
    )])
    .await;
    let client = api(&backend, SessionContext::in_memory());

    let credentials = LoginCredentials::new("admin@example.com", "secret").remember(false);
    let response = client.auth.login(&credentials).await.unwrap();

    assert_eq!(response.token, "t-7");
    assert_eq!(response.user.id, 7);
    assert_eq!(
        backend.only_request().json(),
        json!({"login": "admin@example.com", "password": "secret", "remember": false})
    );
}

#[tokio::test]
async fn test_user_listing_is_normalized() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::GET,
        "/admin/users",
        200,
        json!({
            "message": "Users fetched",
            "data": {
                "data": [
                    {"id": 1, "attribute": {"first_name": "Amina", "email": "a@example.com", "role": 2}},
                    {"id": 2, "attribute": {"first_name": "Kofi", "email": "k@example.com", "deleted_at": "2024-03-01"}}
                ],
                "pagination": {"total": 12, "per_page": 2, "current_page": 1, "last_page": 6}
            },
            "code": 200
        }),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let query = UserQuery {
        page: Some(1),
        show: Some(2),
        deleted_at: Some("deleted".to_string()),
        ..UserQuery::default()
    };
    let page = client.users.list(&query).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].role.as_deref(), Some("2"));
    assert!(page.items[1].is_deleted());
    assert_eq!((page.total, page.last_page), (12, 6));
    assert!(page.has_next());

    let request_query = backend.only_request().query.unwrap();
    assert!(request_query.contains("show=2"));
    assert!(request_query.contains("deleted_at=deleted"));
}

#[tokio::test]
async fn test_get_user_unwraps_envelope() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::GET,
        "/admin/users/12",
        200,
        json!({
            "message": "User fetched successfully",
            "data": {"id": 12, "created_at": "2024-01-01", "attribute": {"email": "u@example.com", "image": 44}}
        }),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let user = client.users.get(12).await.unwrap();
    assert_eq!(user.id, 12);
    assert_eq!(user.image, Some(ImageRef::Id(44)));
    assert_eq!(user.created_at.as_deref(), Some("2024-01-01"));
}

#[tokio::test]
async fn test_soft_delete_and_restore_send_deleted_at() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::PUT,
        "/admin/users/3",
        200,
        json!({"message": "updated"}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    client.users.soft_delete(3).await.unwrap();
    client.users.restore(3).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].json()["deleted_at"].is_string());
    assert_eq!(requests[1].json(), json!({"deleted_at": null}));
}

#[tokio::test]
async fn test_user_update_with_image_goes_multipart() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::POST,
        "/admin/users/3",
        200,
        json!({"data": {"id": 3, "attribute": {"city": "Accra", "image": "avatars/3.png"}}}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let update = UserUpdate {
        city: Some("Accra".to_string()),
        image: Some(FileUpload::new("me.jpg", vec![1, 2, 3])),
        ..UserUpdate::default()
    };
    let user = client.users.update(3, &update).await.unwrap();
    assert_eq!(user.city.as_deref(), Some("Accra"));

    let request = backend.only_request();
    assert!(request.content_type.unwrap().starts_with("multipart/form-data"));
    assert!(request.body.contains("name=\"city\""));
    assert!(request.body.contains("name=\"_method\""));
    assert!(request.body.contains("filename=\"me.jpg\""));
}

#[tokio::test]
async fn test_invalid_new_user_is_not_sent() {
    let backend = FakeBackend::spawn(vec![]).await;
    let client = api(&backend, signed_in_session("tok"));

    let user = NewUser {
        email: "not-an-email".to_string(),
        ..NewUser::default()
    };
    let error = client.users.create(&user).await.unwrap_err();

    assert!(matches!(error, ClientError::Rejected { .. }));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_profile_update_accepts_user_wrapper() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::POST,
        "/profile/update",
        200,
        json!({"user": {"id": 1, "first_name": "Ada"}}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let update = UserUpdate {
        first_name: Some("Ada".to_string()),
        ..UserUpdate::default()
    };
    let user = client.users.update_profile(&update).await.unwrap();
    assert_eq!(user.first_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_course_listing_from_flat_paginator() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::GET,
        "/courses",
        200,
        json!({
            "data": [
                {"id": 4, "title": "Guitar", "phone_num": "[\"555-1\",\"555-2\"]", "course_type_id": 2}
            ],
            "current_page": 1,
            "last_page": 1,
            "per_page": 15,
            "total": 1
        }),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let page = client.courses.list(&CourseQuery::default()).await.unwrap();
    let course = &page.items[0];
    assert_eq!(course.name, "Guitar");
    assert_eq!(course.phone_display, "555-1, 555-2");
    assert_eq!(course.type_id, Some(2));
    assert_eq!(page.per_page, 15);
}

#[tokio::test]
async fn test_course_type_lookup_from_array_response() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::GET,
        "/admin/type-courses/8",
        200,
        json!([{"name": "Dance", "icon": null}]),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let course_type = client.course_types.get(8).await.unwrap();
    assert_eq!(course_type.id, 8);
    assert_eq!(course_type.name, "Dance");
}

#[tokio::test]
async fn test_course_type_lookup_without_identity_is_malformed() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::GET,
        "/admin/type-courses/8",
        200,
        json!({"message": "ok"}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let error = client.course_types.get(8).await.unwrap_err();
    assert!(matches!(error, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_course_type_create_reads_icon_from_disk() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::POST,
        "/admin/type-courses",
        201,
        json!({"data": {"id": 9, "name": "Art", "icon": "icons/art.svg"}}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("art.svg");
    std::fs::write(&path, "<svg/>").unwrap();
    let icon = FileUpload::from_path(&path).await.unwrap();
    assert_eq!(icon.mime, "image/svg+xml");

    let created = client
        .course_types
        .create(&NewCourseType {
            name: "Art".to_string(),
            icon: Some(icon),
        })
        .await
        .unwrap();
    assert_eq!(created.id, 9);

    let request = backend.only_request();
    assert!(request.body.contains("filename=\"art.svg\""));
    assert!(request.body.contains("<svg/>"));
    assert!(!request.body.contains("_method"));
}

#[tokio::test]
async fn test_user_import_uploads_file_as_multipart() {
    let backend = FakeBackend::spawn(vec![Canned::new(
        Method::POST,
        "/admin/users/import",
        200,
        json!({"message": "Import finished", "data": {"created": 2, "failed": 0}}),
    )])
    .await;
    let client = api(&backend, signed_in_session("tok"));

    let file = FileUpload::new("users.csv", b"email\na@example.com\nb@example.com\n".to_vec());
    let report = client.users.import(file).await.unwrap();
    assert_eq!(report, json!({"created": 2, "failed": 0}));

    let request = backend.only_request();
    assert!(request.content_type.unwrap().starts_with("multipart/form-data"));
    assert!(request.body.contains("name=\"file\""));
    assert!(request.body.contains("filename=\"users.csv\""));
    assert!(request.body.contains("text/csv"));
    assert!(request.body.contains("b@example.com"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_empty_import_file_is_not_sent() {
    let backend = FakeBackend::spawn(vec![]).await;
    let client = api(&backend, signed_in_session("tok"));

    let error = client
        .users
        .import(FileUpload::new("users.csv", Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(error, ClientError::Rejected { .. }));
    assert!(backend.requests().is_empty());
}
