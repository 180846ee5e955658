use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use service_core::error::AppError;

/// Pub/sub channel names consumed by the admin UI for live refresh.
pub mod channel {
    pub const PRODUCT_UPDATED: &str = "product-updated";
    pub const TRANSACTION_COMPLETED: &str = "transaction-completed";
    pub const CUSTOMER_REGISTERED: &str = "customer-registered";
}

/// Fire-and-forget event publication after successful mutations.
///
/// Publishing never fails the calling request; failures are logged.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value);
}

#[derive(Clone)]
pub struct RedisEventPublisher {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisEventPublisher {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        tracing::info!(url = %url, "Connecting to Redis event channel");
        let client = Client::open(url)?;

        // ConnectionManager reconnects on its own
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Connected to Redis event channel");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) {
        let mut conn = self.manager.clone();
        let body = payload.to_string();
        let result: Result<i64, redis::RedisError> = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(&body)
            .query_async(&mut conn)
            .await;

        match result {
            Ok(subscribers) => {
                tracing::debug!(channel = %channel, subscribers, "Event published");
            }
            Err(e) => {
                tracing::warn!(channel = %channel, "Failed to publish event: {}", e);
            }
        }
    }
}

/// No-op publisher used when no event channel is configured (tests, dev).
#[derive(Clone, Default)]
pub struct NullEventPublisher;

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish(&self, channel: &str, _payload: serde_json::Value) {
        tracing::debug!(channel = %channel, "Event channel disabled, dropping event");
    }
}
