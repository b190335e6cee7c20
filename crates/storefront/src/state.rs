//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{DynStore, Store};
use crate::services::{EmailService, PaymentGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store, the payment gateway and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: DynStore,
    gateway: Arc<dyn PaymentGateway>,
    email: Option<EmailService>,
    /// Set when the store is `PostgreSQL`; used for readiness checks.
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Persistence backend
    /// * `gateway` - Payment gateway used at checkout
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: DynStore,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self::build(config, store, gateway, None, None)
    }

    /// Create a state with every optional collaborator.
    #[must_use]
    pub fn build(
        config: StorefrontConfig,
        store: DynStore,
        gateway: Arc<dyn PaymentGateway>,
        email: Option<EmailService>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                gateway,
                email,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// The payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    /// The mailer, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// The database pool, if the store is `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
