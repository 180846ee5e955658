use inventory_service::config::InventoryConfig;
use inventory_service::services::{init_metrics, MongoDb};
use inventory_service::startup::Application;
use reqwest::Client;
use serde_json::json;
use std::sync::Once;
use uuid::Uuid;

pub const TEST_USER_ID: &str = "test_user_123";

// Initialize the metrics recorder once for the whole test binary
static INIT_METRICS: Once = Once::new();

fn ensure_metrics_initialized() {
    INIT_METRICS.call_once(init_metrics);
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        ensure_metrics_initialized();

        if std::env::var("MONGODB_URI").is_err() {
            std::env::set_var("MONGODB_URI", "mongodb://localhost:27017");
        }

        let db_name = format!("inventory_test_{}", Uuid::new_v4());

        let mut config = InventoryConfig::load().expect("Failed to load configuration");
        config.common.port = 0; // Random port for testing
        config.mongodb.database = db_name.clone();
        config.events.redis_url = None; // No Redis in tests, events are dropped

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to come up by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
        }
    }

    /// Drop the per-test database.
    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}

/// Create a product and return its id.
#[allow(dead_code)]
pub async fn create_product(
    app: &TestApp,
    client: &Client,
    name: &str,
    low: i64,
    near_low: i64,
) -> String {
    let response = client
        .post(format!("{}/products", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "name": name,
            "category": "Laptops",
            "model": "X-2024",
            "buying_price": "80",
            "selling_price": "100",
            "low_stock_threshold": low,
            "near_low_stock_threshold": near_low,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["id"].as_str().expect("Product id missing").to_string()
}

/// Add units by serial number to an existing product.
#[allow(dead_code)]
pub async fn add_units(app: &TestApp, client: &Client, product_id: &str, serials: &[&str]) {
    let units: Vec<serde_json::Value> = serials
        .iter()
        .map(|s| json!({ "serial_number": s }))
        .collect();

    let response = client
        .post(format!("{}/products/{}/units", app.address, product_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "units": units }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());
}

/// Reserve the given serials of one product in a new transaction and return
/// the transaction's id.
#[allow(dead_code)]
pub async fn create_transaction(
    app: &TestApp,
    client: &Client,
    product_id: &str,
    serials: &[&str],
) -> String {
    let response = client
        .post(format!("{}/transactions", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "products": [{ "product_id": product_id, "serial_numbers": serials }],
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    body["id"]
        .as_str()
        .expect("Transaction id missing")
        .to_string()
}

/// Complete a reserved transaction with a cash payment.
#[allow(dead_code)]
pub async fn complete_transaction(app: &TestApp, client: &Client, transaction_id: &str) {
    let response = client
        .post(format!(
            "{}/transactions/{}/complete",
            app.address, transaction_id
        ))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "payment_method": "cash", "total_amount_paid": "224" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());
}

/// Fetch a product over HTTP and return the response body.
#[allow(dead_code)]
pub async fn get_product(app: &TestApp, client: &Client, product_id: &str) -> serde_json::Value {
    let response = client
        .get(format!("{}/products/{}", app.address, product_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse JSON")
}

/// Status of one stored unit, read straight from the database.
#[allow(dead_code)]
pub async fn stored_unit_status(app: &TestApp, product_id: &str, serial: &str) -> String {
    let product = app
        .db
        .products()
        .find_one(mongodb::bson::doc! { "_id": product_id }, None)
        .await
        .unwrap()
        .expect("Product not found in DB");
    product
        .unit(serial)
        .expect("Unit not found in DB")
        .status
        .to_string()
}
