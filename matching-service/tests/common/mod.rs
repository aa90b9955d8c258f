//! Shared setup for matching-service integration tests.
//!
//! Drives the real router in-process over the in-memory store with a
//! recording SMS provider.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use matching_service::{
    build_router,
    config::{
        Environment, MatchingConfig, MongoConfig, SecurityConfig, StoreBackend, StoreConfig,
        TokenConfig, TwilioConfig,
    },
    models::{Company, Volunteer},
    services::{MockSmsProvider, Store},
    AppState,
};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret";

pub fn test_config() -> MatchingConfig {
    MatchingConfig {
        common: CommonConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        environment: Environment::Dev,
        service_name: "matching-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        store: StoreConfig {
            backend: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: String::new(),
                database: "matching_test".to_string(),
            },
        },
        token: TokenConfig {
            secret: Secret::new("integration-test-secret".to_string()),
            expiry_hours: 1,
        },
        twilio: TwilioConfig {
            account_sid: String::new(),
            auth_token: Secret::new(String::new()),
            from_number: String::new(),
            enabled: false,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            signup_attempts: 1000,
            login_attempts: 1000,
            rate_limit_window_seconds: 60,
            trust_forwarded_for: false,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sms: Arc<MockSmsProvider>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::build(test_config(), MockSmsProvider::new())
    }

    pub fn build(config: MatchingConfig, sms: MockSmsProvider) -> Self {
        let sms = Arc::new(sms);
        let state = AppState::new(config, Store::in_memory(), sms.clone());
        let router = build_router(state.clone());
        Self { router, state, sms }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(bearer(token)), None).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(bearer(token)), Some(body))
            .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(bearer(token)), None).await
    }

    pub async fn login(&self, actor: &str, login: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            Method::GET,
            &format!("/{}/login", actor),
            Some(basic(login, password)),
            None,
        )
        .await
    }

    /// Sign up a volunteer and return its session token.
    pub async fn signup_volunteer(&self, first_name: &str, user_name: &str, phone: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/volunteer/signup",
                None,
                Some(json!({
                    "firstName": first_name,
                    "lastName": "Doe",
                    "userName": user_name,
                    "email": format!("{}@x.com", user_name),
                    "phoneNumber": phone,
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "volunteer signup failed: {}", body);
        token_of(&body)
    }

    /// Sign up a company and return its session token.
    pub async fn signup_company(&self, company_name: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/company/signup",
                None,
                Some(json!({
                    "companyName": company_name,
                    "email": format!("hr@{}.com", company_name.to_lowercase()),
                    "phoneNumber": "555-0000",
                    "website": format!("https://{}.example", company_name.to_lowercase()),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "company signup failed: {}", body);
        token_of(&body)
    }

    pub async fn volunteer_for(&self, token: &str) -> Volunteer {
        self.state
            .gate::<Volunteer>()
            .bearer(token)
            .await
            .expect("token should resolve to a volunteer")
    }

    pub async fn company_for(&self, token: &str) -> Company {
        self.state
            .gate::<Company>()
            .bearer(token)
            .await
            .expect("token should resolve to a company")
    }
}

pub fn basic(login: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", login, password)))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn token_of(body: &Value) -> String {
    body["token"]
        .as_str()
        .expect("response should carry a token")
        .to_string()
}

pub fn message_of(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}
