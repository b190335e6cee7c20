//! Integration test support for Dealshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dealshop-integration-tests
//! ```
//!
//! Everything runs in-process: the real storefront router is driven with
//! `tower::ServiceExt::oneshot`, backed by the in-memory store, an in-memory
//! session store and a [`MockGateway`] standing in for `CinetPay`.
//!
//! # Fixtures
//!
//! One async function per fixture. Fixtures that depend on others take them
//! as arguments, so a test builds exactly the data it needs:
//!
//! ```rust,ignore
//! let app = TestApp::new();
//! let user = fixtures::user(&app.store).await;
//! let shop = fixtures::shop(&app.store, &user).await;
//! let product = fixtures::product_without_promotion(&app.store, &shop).await;
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::SecretString;
use tower::ServiceExt;

use dealshop_core::{CurrencyCode, Price};
use dealshop_storefront::config::{CinetPayConfig, StoreBackend, StorefrontConfig};
use dealshop_storefront::db::MemoryStore;
use dealshop_storefront::middleware::SESSION_COOKIE_NAME;
use dealshop_storefront::services::{
    GatewayStatus, PaymentError, PaymentGateway, PaymentLink, PaymentRequest, PaymentVerification,
};
use dealshop_storefront::state::AppState;

pub mod fixtures;

/// Public URL the test app believes it is served from.
pub const BASE_URL: &str = "http://localhost:3000";

/// Payment page the mock gateway sends customers to.
pub const MOCK_PAYMENT_URL: &str = "https://checkout.cinetpay.com/payment/mock";

/// Configuration for an in-memory storefront.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        store: StoreBackend::Memory,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: BASE_URL.to_owned(),
        session_secret: SecretString::from("kT9#vQ2$mW7!pL4@xN8&rB3*zF6^hJ1%".to_owned()),
        cinetpay: CinetPayConfig {
            api_key: SecretString::from("mock-api-key".to_owned()),
            site_id: "445566".to_owned(),
            base_url: "http://cinetpay.invalid".to_owned(),
            currency: CurrencyCode::XOF,
        },
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

// =============================================================================
// Mock Gateway
// =============================================================================

/// Hand-written [`PaymentGateway`] that records every call.
///
/// Verification answers with the amount and currency of the matching payment
/// request unless [`MockGateway::set_verified_amount`] overrides it.
#[derive(Debug)]
pub struct MockGateway {
    fail_generate: bool,
    status: Mutex<GatewayStatus>,
    verified_amount: Mutex<Option<Price>>,
    requests: Mutex<Vec<PaymentRequest>>,
    generate_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MockGateway {
    /// A gateway that issues links and reports payments as accepted.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::build(false, GatewayStatus::Accepted)
    }

    /// A gateway whose payment link call fails with an API error.
    #[must_use]
    pub fn failing() -> Self {
        Self::build(true, GatewayStatus::Refused)
    }

    fn build(fail_generate: bool, status: GatewayStatus) -> Self {
        Self {
            fail_generate,
            status: Mutex::new(status),
            verified_amount: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            generate_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Status reported by subsequent verifications.
    pub fn set_status(&self, status: GatewayStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Amount reported by subsequent verifications.
    pub fn set_verified_amount(&self, amount: Price) {
        *self
            .verified_amount
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(amount);
    }

    /// Payment requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn generate_payment_url(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentLink, PaymentError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_generate {
            return Err(PaymentError::Api {
                code: "608".to_owned(),
                message: "MINIMUM_REQUIRED_FIELDS".to_owned(),
            });
        }

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        Ok(PaymentLink {
            payment_url: format!("{MOCK_PAYMENT_URL}?transaction_id={}", request.transaction_id),
            payment_token: format!("TOKEN-{}", request.transaction_id),
        })
    }

    async fn verify_payment(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentVerification, PaymentError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let request = self
            .requests()
            .into_iter()
            .find(|r| r.transaction_id == transaction_id)
            .ok_or_else(|| PaymentError::Api {
                code: "627".to_owned(),
                message: "TRANSACTION_NOT_FOUND".to_owned(),
            })?;

        let amount = self
            .verified_amount
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(request.amount);

        Ok(PaymentVerification {
            status: *self.status.lock().unwrap_or_else(PoisonError::into_inner),
            transaction_id: transaction_id.to_owned(),
            amount,
            currency: request.currency,
        })
    }
}

// =============================================================================
// Test App
// =============================================================================

/// Response with the body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie, if the response sets one.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
            .filter_map(|v| v.split(';').next())
            .map(str::to_owned)
            .next()
    }
}

/// Storefront router over an in-memory store.
pub struct TestApp {
    pub store: MemoryStore,
    pub gateway: Arc<MockGateway>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App with a gateway that accepts every payment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(MockGateway::succeeding())
    }

    #[must_use]
    pub fn with_gateway(gateway: MockGateway) -> Self {
        let store = MemoryStore::new();
        let gateway = Arc::new(gateway);
        let state = AppState::new(
            test_config(),
            Arc::new(store.clone()),
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
        );
        let router = dealshop_storefront::app(state, tower_sessions::MemoryStore::default());

        Self {
            store,
            gateway,
            router,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::get(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// `POST path` with a urlencoded form body.
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut builder = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).expect("valid request"))
            .await
    }

    /// Log in through the form and return the session cookie.
    pub async fn login(&self, login: &str, password: &str) -> String {
        let response = self
            .post_form("/login", &[("login", login), ("password", password)], None)
            .await;
        assert_eq!(response.status, StatusCode::FOUND, "login failed");
        assert_eq!(response.location(), Some("/"));
        response
            .session_cookie()
            .expect("login sets a session cookie")
    }
}
