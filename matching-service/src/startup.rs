use axum::Router;
use service_core::error::AppError;
use service_core::middleware::rate_limit::spawn_pruning;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::{MatchingConfig, StoreBackend};
use crate::services::{MockSmsProvider, MongoDb, SmsProvider, Store, TwilioProvider};
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: MatchingConfig) -> Result<Self, AppError> {
        let store = build_store(&config).await?;
        let sms = build_sms_provider(&config);

        let state = AppState::new(config.clone(), store, sms);
        spawn_pruning(
            vec![
                state.signup_rate_limiter.limiter.clone(),
                state.login_rate_limiter.limiter.clone(),
            ],
            Duration::from_secs(config.security.rate_limit_window_seconds.max(1)),
        );
        let app: Router = build_router(state);

        let addr = config.common.bind_address();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(address = %addr, port, "Listening");

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn build_store(config: &MatchingConfig) -> Result<Store, AppError> {
    match config.store.backend {
        StoreBackend::Mongodb => {
            let mongo = &config.store.mongodb;
            let db = MongoDb::connect(&mongo.uri, &mongo.database).await?;
            db.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Store::mongo(&db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Ok(Store::in_memory())
        }
    }
}

fn build_sms_provider(config: &MatchingConfig) -> Arc<dyn SmsProvider> {
    if config.twilio.enabled {
        tracing::info!("SMS notifications via Twilio");
        Arc::new(TwilioProvider::new(config.twilio.clone()))
    } else {
        tracing::info!("Twilio disabled; SMS notifications are logged only");
        Arc::new(MockSmsProvider::new())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
