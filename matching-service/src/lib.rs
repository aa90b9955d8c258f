pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimit},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::MatchingConfig;
use crate::models::Account;
use crate::services::{
    AccountsOf, AuthGate, CredentialStore, RelationshipLedger, SmsProvider, Store, TokenService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: MatchingConfig,
    pub store: Store,
    pub tokens: TokenService,
    pub ledger: Arc<RelationshipLedger>,
    pub signup_rate_limiter: IpRateLimit,
    pub login_rate_limiter: IpRateLimit,
}

impl AppState {
    pub fn new(config: MatchingConfig, store: Store, sms: Arc<dyn SmsProvider>) -> Self {
        let tokens = TokenService::new(&config.token);
        let ledger = Arc::new(RelationshipLedger::new(store.clone(), sms));
        let security = &config.security;
        let signup_rate_limiter = IpRateLimit::new(
            security.signup_attempts,
            security.rate_limit_window_seconds,
            security.trust_forwarded_for,
        );
        let login_rate_limiter = IpRateLimit::new(
            security.login_attempts,
            security.rate_limit_window_seconds,
            security.trust_forwarded_for,
        );

        Self {
            config,
            store,
            tokens,
            ledger,
            signup_rate_limiter,
            login_rate_limiter,
        }
    }

    pub fn credentials<A: Account>(&self) -> CredentialStore<A>
    where
        Store: AccountsOf<A>,
    {
        CredentialStore::new(AccountsOf::<A>::accounts(&self.store), self.tokens.clone())
    }

    pub fn gate<A: Account>(&self) -> AuthGate<A>
    where
        Store: AccountsOf<A>,
    {
        AuthGate::new(self.credentials::<A>())
    }
}

pub fn build_router(state: AppState) -> Router {
    let signup_routes = Router::new()
        .route("/volunteer/signup", post(handlers::volunteer::signup))
        .route("/company/signup", post(handlers::company::signup))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let login_routes = Router::new()
        .route("/volunteer/login", get(handlers::volunteer::login))
        .route("/company/login", get(handlers::company::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let volunteer_routes = Router::new()
        .route(
            "/volunteer/opportunities",
            get(handlers::volunteer::opportunities),
        )
        .route("/volunteer/pending", get(handlers::volunteer::pending))
        .route("/volunteer/active", get(handlers::volunteer::active))
        .route("/volunteer/update", put(handlers::volunteer::update))
        .route("/volunteer/apply", put(handlers::volunteer::apply))
        .route("/volunteer/leave", put(handlers::volunteer::leave))
        .route("/volunteer/delete", delete(handlers::volunteer::delete));

    let company_routes = Router::new()
        .route("/company/pending", get(handlers::company::pending))
        .route("/company/active", get(handlers::company::active))
        .route("/company/update", put(handlers::company::update))
        .route("/company/approve", put(handlers::company::approve))
        .route("/company/terminate", put(handlers::company::terminate))
        .route("/company/delete", delete(handlers::company::delete));

    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .merge(signup_routes)
        .merge(login_routes)
        .merge(volunteer_routes)
        .merge(company_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    actor_id = tracing::field::Empty,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
