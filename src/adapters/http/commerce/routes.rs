//! Axum router configuration for the commerce endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    capture_order, checkout_return, delete_webhook_registration, health, receive_webhook,
    register_webhook, simulation_status, start_simulation, CommerceAppState,
};

/// Create the admin router.
///
/// # Routes
/// - `POST /orders/:id/capture` - Capture an authorized payment
/// - `POST /webhooks/register` - Register the shop's webhook with PayPal
/// - `DELETE /webhooks/register` - Remove the registration
/// - `POST /webhooks/simulate` - Start a webhook simulation
/// - `GET /webhooks/simulate` - Simulation status
pub fn admin_routes() -> Router<CommerceAppState> {
    Router::new()
        .route("/orders/:id/capture", post(capture_order))
        .route(
            "/webhooks/register",
            post(register_webhook).delete(delete_webhook_registration),
        )
        .route(
            "/webhooks/simulate",
            post(start_simulation).get(simulation_status),
        )
}

/// Create the complete commerce router.
///
/// # Routes
/// - `GET /health`
/// - `POST /webhooks/paypal` - PayPal webhook deliveries (signature verified)
/// - `GET /checkout/return?token=` - Shopper returning from PayPal
/// - `/admin/...` - see [`admin_routes`]
pub fn commerce_router() -> Router<CommerceAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/paypal", post(receive_webhook))
        .route("/checkout/return", get(checkout_return))
        .nest("/admin", admin_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::events::RecordingOrderEventPublisher;
    use crate::adapters::http::commerce::{CommercePorts, CommerceSettings};
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, InMemoryOrderRepository};

    fn test_state() -> CommerceAppState {
        CommerceAppState::new(
            CommercePorts {
                gateway: Arc::new(MockPayPalGateway::new()),
                kv: Arc::new(InMemoryKeyValueStore::new()),
                orders: Arc::new(InMemoryOrderRepository::new()),
                events: Arc::new(RecordingOrderEventPublisher::new()),
            },
            CommerceSettings::default(),
        )
    }

    async fn send(router: Router, method: &str, uri: &str) -> StatusCode {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn commerce_router_creates_router() {
        let _: Router<()> = commerce_router().with_state(test_state());
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(send(app, "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn return_without_token_is_empty_ok() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(send(app, "GET", "/checkout/return").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn capture_of_unknown_order_is_not_found() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(
            send(app, "POST", "/admin/orders/77/capture").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn capture_with_bad_id_is_bad_request() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(
            send(app, "POST", "/admin/orders/abc/capture").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn simulation_without_registration_is_conflict() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(
            send(app, "POST", "/admin/webhooks/simulate").await,
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn idle_simulation_status_is_ok() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(
            send(app, "GET", "/admin/webhooks/simulate").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn malformed_webhook_is_bad_request() {
        let app = commerce_router().with_state(test_state());
        assert_eq!(
            send(app, "POST", "/webhooks/paypal").await,
            StatusCode::BAD_REQUEST
        );
    }
}
