//! HTTP-level tests for the notification inbox.

mod common;

use axum::http::StatusCode;
use common::{apply, body_json, create_job, delete_auth, get_auth, post_auth};

/// Company 1 gets one `newApplication` per applicant.
async fn seed(app: &common::TestApp, applicants: i64) {
    let company = app.company(1);
    let job_id = create_job(app, &company, applicants as i32).await;
    for id in 0..applicants {
        apply(app, &app.subcontractor(100 + id), job_id).await;
    }
}

#[tokio::test]
async fn list_is_paginated_and_scoped_to_the_receiver() {
    let app = common::build_test_app();
    seed(&app, 3).await;
    let company = app.company(1);

    let json = body_json(
        get_auth(app.app(), "/api/v1/notifications?page=1&limit=2", &company).await,
    )
    .await;
    let data = &json["data"];
    assert_eq!(data["total"], 3);
    assert_eq!(data["page"], 1);
    assert_eq!(data["limit"], 2);
    assert_eq!(data["total_pages"], 2);
    assert_eq!(data["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(data["notifications"][0]["notification_type"], "newApplication");
    assert_eq!(data["notifications"][0]["receiver_type"], "company");

    // Same id, other actor type: nothing.
    let json = body_json(get_auth(app.app(), "/api/v1/notifications", &app.subcontractor(1)).await)
        .await;
    assert_eq!(json["data"]["total"], 0);
}

#[tokio::test]
async fn read_state_and_unread_views() {
    let app = common::build_test_app();
    seed(&app, 2).await;
    let company = app.company(1);

    let json = body_json(get_auth(app.app(), "/api/v1/notifications/unread-count", &company).await)
        .await;
    assert_eq!(json["data"]["count"], 2);

    let list = body_json(get_auth(app.app(), "/api/v1/notifications", &company).await).await;
    let id = list["data"]["notifications"][0]["id"].as_i64().unwrap();

    let response = post_auth(app.app(), &format!("/api/v1/notifications/{id}/read"), &company).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_read"], true);
    assert!(json["data"]["read_at"].is_string());

    let unread = body_json(get_auth(app.app(), "/api/v1/notifications/unread", &company).await).await;
    assert_eq!(unread["data"]["total"], 1);
    let unread = body_json(
        get_auth(app.app(), "/api/v1/notifications?unread_only=true", &company).await,
    )
    .await;
    assert_eq!(unread["data"]["total"], 1);

    let response = post_auth(app.app(), "/api/v1/notifications/read-all", &company).await;
    assert_eq!(body_json(response).await["data"]["updated"], 1);

    let json = body_json(get_auth(app.app(), "/api/v1/notifications/unread-count", &company).await)
        .await;
    assert_eq!(json["data"]["count"], 0);
}

#[tokio::test]
async fn foreign_notifications_are_not_found() {
    let app = common::build_test_app();
    seed(&app, 1).await;
    let company = app.company(1);
    let list = body_json(get_auth(app.app(), "/api/v1/notifications", &company).await).await;
    let id = list["data"]["notifications"][0]["id"].as_i64().unwrap();

    let stranger = app.company(2);
    let response = post_auth(app.app(), &format!("/api/v1/notifications/{id}/read"), &stranger).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = delete_auth(app.app(), &format!("/api/v1/notifications/{id}"), &stranger).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app.app(), &format!("/api/v1/notifications/{id}"), &company).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let json = body_json(get_auth(app.app(), "/api/v1/notifications", &company).await).await;
    assert_eq!(json["data"]["total"], 0);
}
