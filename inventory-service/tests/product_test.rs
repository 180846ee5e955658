mod common;

use common::{add_units, create_product, get_product, TestApp, TEST_USER_ID};
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn create_product_and_add_units_works() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "ThinkBook 14", 1, 2).await;

    let response = client
        .post(format!("{}/products/{}/units", app.address, product_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "units": [
                { "serial_number": "SN-001" },
                { "serial_number": "SN-002" },
                { "serial_number": "SN-003" },
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["available"], 3);
    assert_eq!(body["stock_status"], "HIGH");
    assert_eq!(body["units"].as_array().unwrap().len(), 3);
    assert_eq!(body["units"][0]["status"], "in_stock");

    // Verify DB
    let stored = app
        .db
        .products()
        .find_one(mongodb::bson::doc! { "_id": &product_id }, None)
        .await
        .unwrap()
        .expect("Product not found in DB");
    assert_eq!(stored.units.len(), 3);
    assert_eq!(stored.available(), 3);

    app.cleanup().await;
}

#[tokio::test]
async fn requests_without_user_context_are_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/products", app.address))
        .json(&json!({
            "name": "No user",
            "category": "Misc",
            "model": "M",
            "buying_price": "1",
            "selling_price": "2",
            "low_stock_threshold": 1,
            "near_low_stock_threshold": 2,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(401, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_serial_within_product_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Duplicate serials", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-100"]).await;

    let response = client
        .post(format!("{}/products/{}/units", app.address, product_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "units": [{ "serial_number": "SN-100" }] }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(409, response.status().as_u16());

    // The rejected batch added nothing
    let body = get_product(&app, &client, &product_id).await;
    assert_eq!(body["available"], 1);

    app.cleanup().await;
}

#[tokio::test]
async fn threshold_update_reclassifies_product() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Reclassified", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-A", "SN-B", "SN-C"]).await;

    let body = get_product(&app, &client, &product_id).await;
    assert_eq!(body["stock_status"], "HIGH");

    // Raising the low threshold above the available count flips the status
    // without touching any unit.
    let response = client
        .put(format!("{}/products/{}/thresholds", app.address, product_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "low_stock_threshold": 5, "near_low_stock_threshold": 10 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["available"], 3);
    assert_eq!(body["stock_status"], "LOW");

    app.cleanup().await;
}

#[tokio::test]
async fn out_of_range_thresholds_are_stored_and_sanitized_on_read() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Legacy thresholds", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-A"]).await;

    let response = client
        .put(format!("{}/products/{}/thresholds", app.address, product_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "low_stock_threshold": -3, "near_low_stock_threshold": -1 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    // Stored verbatim
    assert_eq!(body["low_stock_threshold"], -3);
    assert_eq!(body["near_low_stock_threshold"], -1);
    // Classified as if both thresholds were zero: one unit on hand is HIGH
    assert_eq!(body["stock_status"], "HIGH");

    app.cleanup().await;
}

#[tokio::test]
async fn list_products_filters_by_derived_stock_status() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let empty_id = create_product(&app, &client, "Empty shelf", 1, 2).await;
    let stocked_id = create_product(&app, &client, "Stocked shelf", 1, 2).await;
    add_units(&app, &client, &stocked_id, &["SN-1", "SN-2", "SN-3"]).await;

    let response = client
        .get(format!(
            "{}/products?stock_status=OUT_OF_STOCK",
            app.address
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["total"], 1);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], empty_id.as_str());
    assert_eq!(products[0]["stock_status"], "OUT_OF_STOCK");

    app.cleanup().await;
}
