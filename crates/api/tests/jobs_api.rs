//! HTTP-level tests for the `/jobs` resource.

mod common;

use axum::http::StatusCode;
use common::{
    apply, body_json, create_job, delete_auth, get_auth, job_body, post_auth, post_json_auth,
    put_json_auth,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn company_creates_a_pending_request_job() {
    let app = common::build_test_app();
    let token = app.company(1);

    let response = post_json_auth(app.app(), "/api/v1/jobs", &token, job_body(2)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["kind"], "request");
    assert_eq!(json["data"]["company_id"], 1);
    assert_eq!(json["data"]["workers_required"], 2);
    assert_eq!(json["data"]["assigned_workers"], json!([]));
}

#[tokio::test]
async fn subcontractor_cannot_create_jobs() {
    let app = common::build_test_app();
    let token = app.subcontractor(1);

    let response = post_json_auth(app.app(), "/api/v1/jobs", &token, job_body(1)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_job_is_rejected_with_400() {
    let app = common::build_test_app();
    let token = app.company(1);
    let mut body = job_body(1);
    body["hourly_rate"] = json!(0.0);

    let response = post_json_auth(app.app(), "/api/v1/jobs", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn owner_sees_applications_and_offers_others_do_not() {
    let app = common::build_test_app();
    let owner = app.company(1);
    let worker = app.subcontractor(5);
    let job_id = create_job(&app, &owner, 2).await;
    apply(&app, &worker, job_id).await;

    let uri = format!("/api/v1/jobs/{job_id}");
    let json = body_json(get_auth(app.app(), &uri, &owner).await).await;
    assert_eq!(json["data"]["id"], job_id);
    assert_eq!(json["data"]["applications"].as_array().unwrap().len(), 1);
    assert!(json["data"]["offers"].is_array());

    let json = body_json(get_auth(app.app(), &uri, &worker).await).await;
    assert_eq!(json["data"]["id"], job_id);
    assert!(json["data"].get("applications").is_none());

    let response = get_auth(app.app(), "/api/v1/jobs/999", &owner).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_mine_returns_only_own_jobs() {
    let app = common::build_test_app();
    let a = app.company(1);
    let b = app.company(2);
    create_job(&app, &a, 1).await;
    create_job(&app, &a, 1).await;
    create_job(&app, &b, 1).await;

    let json = body_json(get_auth(app.app(), "/api/v1/jobs/mine", &a).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_filters_by_trade_rate_band_and_location() {
    let app = common::build_test_app();
    let company = app.company(1);
    let worker = app.subcontractor(9);

    // 45/h electrician in Bristol.
    create_job(&app, &company, 1).await;

    let mut plumber = job_body(1);
    plumber["trade"] = json!("plumber");
    plumber["site_address"] = json!("1 Quay Street, Bristol");
    post_json_auth(app.app(), "/api/v1/jobs", &company, plumber).await;

    let json = body_json(
        get_auth(app.app(), "/api/v1/jobs/search?trade=electrician", &worker).await,
    )
    .await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["trade"], "electrician");

    // Band is [max - 10, max].
    let json = body_json(
        get_auth(app.app(), "/api/v1/jobs/search?max_hourly_rate=50", &worker).await,
    )
    .await;
    assert_eq!(json["total"], 2);
    let json = body_json(
        get_auth(app.app(), "/api/v1/jobs/search?max_hourly_rate=30", &worker).await,
    )
    .await;
    assert_eq!(json["total"], 0);

    let json = body_json(
        get_auth(app.app(), "/api/v1/jobs/search?location=BRISTOL&limit=1", &worker).await,
    )
    .await;
    assert_eq!(json["total"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["limit"], 1);
    assert_eq!(json["total_pages"], 2);
}

#[tokio::test]
async fn search_hides_jobs_without_open_capacity() {
    let app = common::build_test_app();
    let company = app.company(1);
    let worker = app.subcontractor(2);
    let job_id = create_job(&app, &company, 1).await;
    let application_id = apply(&app, &worker, job_id).await;

    let uri = format!("/api/v1/applications/{application_id}/accept");
    assert_eq!(post_auth(app.app(), &uri, &company).await.status(), StatusCode::OK);

    let json = body_json(get_auth(app.app(), "/api/v1/jobs/search", &worker).await).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn search_past_the_last_page_is_empty() {
    let app = common::build_test_app();
    let worker = app.subcontractor(2);
    create_job(&app, &app.company(1), 1).await;

    let response = get_auth(
        app.app(),
        "/api/v1/jobs/search?page=9223372036854775807",
        &worker,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], json!([]));
    assert_eq!(json["total"], 1);
}

// ---------------------------------------------------------------------------
// Update / delete / start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_patches_a_pending_job() {
    let app = common::build_test_app();
    let company = app.company(1);
    let job_id = create_job(&app, &company, 1).await;

    let uri = format!("/api/v1/jobs/{job_id}");
    let response = put_json_auth(
        app.app(),
        &uri,
        &company,
        json!({ "title": "Install consumer unit and EV charger", "workers_required": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Install consumer unit and EV charger");
    assert_eq!(json["data"]["workers_required"], 3);

    let other = app.company(2);
    let response = put_json_auth(app.app(), &uri, &other, json!({ "title": "Mine now" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn started_job_can_no_longer_be_updated_or_deleted() {
    let app = common::build_test_app();
    let company = app.company(1);
    let job_id = create_job(&app, &company, 2).await;

    let response = post_auth(app.app(), &format!("/api/v1/jobs/{job_id}/start"), &company).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "in_progress");

    let uri = format!("/api/v1/jobs/{job_id}");
    let response = put_json_auth(app.app(), &uri, &company, json!({ "title": "Too late" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_auth(app.app(), &uri, &company).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Starting twice is refused too.
    let response = post_auth(app.app(), &format!("/api/v1/jobs/{job_id}/start"), &company).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_pending_job_removes_its_applications() {
    let app = common::build_test_app();
    let company = app.company(1);
    let worker = app.subcontractor(3);
    let job_id = create_job(&app, &company, 1).await;
    apply(&app, &worker, job_id).await;

    let uri = format!("/api/v1/jobs/{job_id}");
    let response = delete_auth(app.app(), &uri, &company).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.app(), &uri, &company).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(get_auth(app.app(), "/api/v1/applications/mine", &worker).await).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn job_applications_can_be_filtered_by_status() {
    let app = common::build_test_app();
    let company = app.company(1);
    let job_id = create_job(&app, &company, 3).await;
    let first = apply(&app, &app.subcontractor(1), job_id).await;
    apply(&app, &app.subcontractor(2), job_id).await;

    let uri = format!("/api/v1/applications/{first}/reject");
    assert_eq!(post_auth(app.app(), &uri, &company).await.status(), StatusCode::OK);

    let base = format!("/api/v1/jobs/{job_id}/applications");
    let all = body_json(get_auth(app.app(), &base, &company).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let pending =
        body_json(get_auth(app.app(), &format!("{base}?status=pending"), &company).await).await;
    assert_eq!(pending["data"].as_array().unwrap().len(), 1);

    let response = get_auth(app.app(), &base, &app.company(2)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
