//! HTTP adapters - REST API implementations.

pub mod commerce;

use std::time::Duration;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use commerce::{commerce_router, CommerceAppState, CommercePorts, CommerceSettings};

/// Build the application router with tracing, request ids and a timeout.
///
/// Layers wrap outside-in in reverse order of the calls below, so the
/// request id is set before the trace span opens.
pub fn build_app(state: CommerceAppState, request_timeout: Duration) -> Router {
    commerce_router()
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
