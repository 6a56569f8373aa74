//! paypal-commerce HTTP server
//!
//! Serves the PayPal webhook endpoint, the checkout return URL and the
//! admin capture/registration/simulation calls.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paypal_commerce::adapters::events::LoggingOrderEventPublisher;
use paypal_commerce::adapters::http::{build_app, CommerceAppState, CommercePorts, CommerceSettings};
use paypal_commerce::adapters::paypal::{PayPalClient, PayPalClientConfig};
use paypal_commerce::adapters::storage::{
    InMemoryKeyValueStore, InMemoryOrderRepository, RedisKeyValueStore,
};
use paypal_commerce::config::AppConfig;
use paypal_commerce::ports::KeyValueStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(&config);

    let kv = key_value_store(&config).await?;
    let gateway = PayPalClient::new(PayPalClientConfig::from_config(&config.paypal))
        .context("failed to build PayPal client")?;
    let orders = InMemoryOrderRepository::new().with_lock_store(kv.clone());

    let state = CommerceAppState::new(
        CommercePorts {
            gateway: Arc::new(gateway),
            kv,
            orders: Arc::new(orders),
            events: Arc::new(LoggingOrderEventPublisher::new()),
        },
        CommerceSettings::from_config(&config),
    );

    let app = build_app(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        paypal_api = config.paypal.base_url(),
        sandbox = config.paypal.sandbox,
        "paypal-commerce listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// JSON logs in production, human-readable output otherwise.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn key_value_store(config: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    if !config.redis.is_enabled() {
        tracing::warn!("No Redis URL configured, using process-local stores");
        return Ok(Arc::new(InMemoryKeyValueStore::new()));
    }

    let store = tokio::time::timeout(
        config.redis.timeout(),
        RedisKeyValueStore::connect(&config.redis.url, config.redis.key_prefix.clone()),
    )
    .await
    .context("timed out connecting to Redis")??;

    tracing::info!("Connected to Redis");
    Ok(Arc::new(store))
}
