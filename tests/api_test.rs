mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{offline_app, send, test_config, OPERATOR_EMAIL, OPERATOR_PASSWORD};

#[tokio::test]
async fn health_reports_ok() {
    let app = offline_app(test_config("postgres://unused"));
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = offline_app(test_config("postgres://unused"));
    let (status, body) = send(&app, "GET", "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/applications"].is_object());
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = offline_app(test_config("postgres://unused"));
    for (method, uri) in [
        ("GET", "/api/auth/me"),
        ("GET", "/api/applications?mine=true"),
        ("POST", "/api/applications"),
        ("GET", "/api/recruiter/jobs"),
        ("GET", "/api/admin/overview"),
    ] {
        let body = (method == "POST").then(|| json!({ "job_id": Uuid::new_v4() }));
        let (status, json) = send(&app, method, uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(json["code"], "unauthenticated");
    }
}

#[tokio::test]
async fn forged_session_tokens_are_rejected() {
    let app = offline_app(test_config("postgres://unused"));
    let (status, body) = send(&app, "GET", "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn registration_payload_is_validated_before_storage() {
    let app = offline_app(test_config("postgres://unused"));
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "123", "role": "CANDIDATE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": "boss@example.com", "password": "secret1", "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("role"));
}

async fn operator_token(app: &axum::Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": OPERATOR_EMAIL, "password": OPERATOR_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["header"], "x-operator-token");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn operator_login_checks_configured_credentials() {
    let app = offline_app(test_config("postgres://unused"));
    let token = operator_token(&app).await;
    assert!(!token.is_empty());

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": OPERATOR_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn operator_login_is_absent_when_not_configured() {
    let mut config = test_config("postgres://unused");
    config.operator = None;
    let app = offline_app(config);
    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": OPERATOR_EMAIL, "password": OPERATOR_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn operator_cannot_apply_for_jobs() {
    let app = offline_app(test_config("postgres://unused"));
    let token = operator_token(&app).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header("x-operator-token", token)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "job_id": Uuid::new_v4() }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_routes_are_rate_limited() {
    let mut config = test_config("postgres://unused");
    config.public_rps = 1;
    let app = offline_app(config);
    let payload = json!({ "email": "x", "password": "y", "role": "CANDIDATE" });

    let (first, _) = send(&app, "POST", "/api/auth/register", None, Some(payload.clone())).await;
    assert_eq!(first, StatusCode::BAD_REQUEST);
    let (second, body) = send(&app, "POST", "/api/auth/register", None, Some(payload)).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");
}

#[tokio::test]
async fn malformed_requests_get_structured_bad_requests() {
    let app = offline_app(test_config("postgres://unused"));
    let token = operator_token(&app).await;

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/applications/{}/status", Uuid::new_v4()))
        .header("x-operator-token", token.as_str())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "state": "VIEWED" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "validation");
    assert!(body["error"].as_str().unwrap().contains("status"));

    let (status, body) = send(&app, "GET", "/api/jobs/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, body) = send(&app, "GET", "/api/jobs?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
