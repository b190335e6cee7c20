//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (set or propagate `x-request-id`)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID tagging (span field and Sentry tag)
//! 5. Security headers
//! 6. Session layer (tower-sessions; `PostgreSQL` or in-memory store)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use request_id::{REQUEST_ID_HEADER, request_id_layers, tag_request_id};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
