use crate::config::InventoryConfig;
use crate::handlers;
use crate::services::{EventPublisher, MongoDb, NullEventPublisher, RedisEventPublisher};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: InventoryConfig,
    pub db: MongoDb,
    pub events: Arc<dyn EventPublisher>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: InventoryConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let events: Arc<dyn EventPublisher> = match &config.events.redis_url {
            Some(url) => Arc::new(RedisEventPublisher::connect(url).await.map_err(|e| {
                tracing::error!("Failed to connect to Redis event channel: {}", e);
                e
            })?),
            None => {
                tracing::info!("No event channel configured, events will be dropped");
                Arc::new(NullEventPublisher)
            }
        };

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            events,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route(
                "/products",
                post(handlers::products::create_product).get(handlers::products::list_products),
            )
            .route("/products/:id", get(handlers::products::get_product))
            .route(
                "/products/:id/thresholds",
                put(handlers::products::update_thresholds),
            )
            .route("/products/:id/units", post(handlers::products::add_units))
            .route(
                "/transactions",
                post(handlers::transactions::create_transaction)
                    .get(handlers::transactions::list_transactions),
            )
            .route(
                "/transactions/:id",
                get(handlers::transactions::get_transaction),
            )
            .route(
                "/transactions/:id/complete",
                post(handlers::transactions::complete_transaction),
            )
            .route("/refunds", post(handlers::refunds::create_refund))
            .route(
                "/rmas",
                post(handlers::rmas::create_rma).get(handlers::rmas::list_rmas),
            )
            .route("/rmas/:id", get(handlers::rmas::get_rma))
            .route("/rmas/:id/status", patch(handlers::rmas::update_rma_status))
            .route(
                "/customers",
                post(handlers::customers::create_customer)
                    .get(handlers::customers::list_customers),
            )
            .route("/audit-logs", get(handlers::audit::list_audit_logs))
            .route("/reports/stock-summary", get(handlers::reports::stock_summary))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
