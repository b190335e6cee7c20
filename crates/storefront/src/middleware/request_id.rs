//! Request IDs for tracing and error correlation.
//!
//! `tower-http` assigns the ID (keeping one sent by an upstream proxy) and
//! echoes it in the response; [`tag_request_id`] copies it into the tracing
//! span and the Sentry scope.

use axum::{extract::Request, http::HeaderName, middleware::Next, response::Response};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tracing::Span;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layers that set the request ID on the way in and copy it to the response.
///
/// Apply `SetRequestIdLayer` outside of `TraceLayer` so the span can see it.
#[must_use]
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    (
        SetRequestIdLayer::new(header.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header),
    )
}

/// Record the request ID in the current span and as a Sentry tag.
pub async fn tag_request_id(request: Request, next: Next) -> Response {
    if let Some(request_id) = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
    {
        Span::current().record("request_id", request_id);
        sentry::configure_scope(|scope| {
            scope.set_tag("request_id", request_id);
        });
    }

    next.run(request).await
}
