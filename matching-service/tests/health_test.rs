mod common;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
};
use common::{test_config, TestApp};
use matching_service::services::MockSmsProvider;
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_service() {
    let app = TestApp::spawn();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "matching-service-test");
}

#[tokio::test]
async fn test_ready_checks_store() {
    let app = TestApp::spawn();
    let (status, body) = app.call(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"], "up");
}

#[tokio::test]
async fn test_metrics_is_plain_text() {
    let app = TestApp::spawn();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let app = TestApp::spawn();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::spawn();
    let (status, _) = app.call(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn company_signup(n: usize, peer: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = Request::post("/company/signup")
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(
            json!({
                "companyName": format!("Company {}", n),
                "email": format!("hr{}@example.com", n),
                "phoneNumber": "555-0000",
                "website": "https://example.com",
                "password": "secret",
            })
            .to_string(),
        ))
        .unwrap();
    let addr: SocketAddr = format!("{}:50000", peer).parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_signup_is_rate_limited_per_peer() {
    let mut config = test_config();
    config.security.signup_attempts = 2;
    let app = TestApp::build(config, MockSmsProvider::new());

    let mut accepted = 0;
    for n in 0..6 {
        let forwarded_for = format!("10.0.0.{}", n);
        let (status, body) = app
            .send(company_signup(n, "203.0.113.7", &forwarded_for))
            .await;
        if status == StatusCode::OK {
            accepted += 1;
        } else {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(body["statusCode"], 429);
        }
    }
    assert_eq!(accepted, 2);

    let (status, _) = app.send(company_signup(6, "198.51.100.1", "-")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_is_used_behind_trusted_proxy() {
    let mut config = test_config();
    config.security.signup_attempts = 2;
    config.security.trust_forwarded_for = true;
    let app = TestApp::build(config, MockSmsProvider::new());

    for n in 0..2 {
        let (status, _) = app.send(company_signup(n, "10.1.1.1", "203.0.113.7")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = app.send(company_signup(2, "10.1.1.1", "203.0.113.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = app.send(company_signup(3, "10.1.1.1", "198.51.100.1")).await;
    assert_eq!(status, StatusCode::OK);
}
