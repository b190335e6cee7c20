//! Dealshop Storefront - Public e-commerce site.
//!
//! This binary serves the storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates for server-side rendering
//! - `PostgreSQL` (or an in-memory store for demos) for accounts, catalog,
//!   carts and orders
//! - `CinetPay` checkout API for payments
//! - Optional SMTP relay for password reset emails

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use dealshop_storefront::config::{StoreBackend, StorefrontConfig};
use dealshop_storefront::db::{self, MemoryStore, PgStore};
use dealshop_storefront::services::{CinetPayClient, EmailService};
use dealshop_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dealshop_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let gateway = Arc::new(
        CinetPayClient::new(&config.cinetpay).expect("Failed to build CinetPay client"),
    );
    let email = config.email.as_ref().map(|email_config| {
        EmailService::new(email_config).expect("Failed to configure SMTP transport")
    });
    if email.is_none() {
        tracing::warn!("SMTP not configured; password reset links will only be logged");
    }

    let app = match config.store {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_ref()
                .expect("database URL is required for the postgres store");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            // NOTE: Migrations are NOT run automatically on startup.
            // Run them explicitly via: cargo run -p dealshop-cli -- migrate

            let session_store = PostgresStore::new(pool.clone());
            let state = AppState::build(
                config.clone(),
                Arc::new(PgStore::new(pool.clone())),
                gateway,
                email,
                Some(pool),
            );
            dealshop_storefront::app(state, session_store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            let state = AppState::build(
                config.clone(),
                Arc::new(MemoryStore::new()),
                gateway,
                email,
                None,
            );
            dealshop_storefront::app(state, tower_sessions::MemoryStore::default())
        }
    };

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
