mod common;

use common::{
    add_units, complete_transaction, create_product, create_transaction, get_product,
    stored_unit_status, TestApp, TEST_USER_ID,
};
use inventory_service::models::{TransactionStatus, UnitStatus};
use mongodb::bson::doc;
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn reservation_computes_vat_and_totals_once() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Till test", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001", "SN-002", "SN-003"]).await;

    let response = client
        .post(format!("{}/transactions", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "products": [{ "product_id": product_id, "serial_numbers": ["SN-001", "SN-002"] }],
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Reserved");
    assert_eq!(body["payment_status"], "unpaid");
    // 2 units at 100: subtotal 200 ex VAT, 12% VAT on top
    assert_eq!(body["total_price"], "200");
    assert_eq!(body["vat"], "24.00");
    assert_eq!(body["amount_due"], "224.00");
    assert_eq!(body["cashier"], TEST_USER_ID);
    assert!(body["transaction_id"]
        .as_str()
        .unwrap()
        .starts_with("TXN-"));

    // Reservation does not move units; they sell at completion.
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "in_stock");
    assert_eq!(stored_unit_status(&app, &product_id, "SN-002").await, "in_stock");

    app.cleanup().await;
}

#[tokio::test]
async fn completing_a_sale_moves_units_and_stock_status() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Countdown", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001", "SN-002", "SN-003"]).await;

    let body = get_product(&app, &client, &product_id).await;
    assert_eq!(body["stock_status"], "HIGH");

    // Sell two of three: one left on hand, at the low threshold.
    let txn_id = create_transaction(&app, &client, &product_id, &["SN-001", "SN-002"]).await;
    complete_transaction(&app, &client, &txn_id).await;

    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "sold");
    assert_eq!(stored_unit_status(&app, &product_id, "SN-002").await, "sold");

    let body = get_product(&app, &client, &product_id).await;
    assert_eq!(body["available"], 1);
    assert_eq!(body["stock_status"], "LOW");

    // Sell the last unit.
    let txn_id = create_transaction(&app, &client, &product_id, &["SN-003"]).await;
    complete_transaction(&app, &client, &txn_id).await;

    let body = get_product(&app, &client, &product_id).await;
    assert_eq!(body["available"], 0);
    assert_eq!(body["stock_status"], "OUT_OF_STOCK");

    app.cleanup().await;
}

#[tokio::test]
async fn completing_twice_is_a_conflict() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Double tap", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001"]).await;

    let txn_id = create_transaction(&app, &client, &product_id, &["SN-001"]).await;
    complete_transaction(&app, &client, &txn_id).await;

    let response = client
        .post(format!("{}/transactions/{}/complete", app.address, txn_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "payment_method": "cash", "total_amount_paid": "112" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(409, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn reserving_a_missing_unit_is_not_found() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "No such serial", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001"]).await;

    let response = client
        .post(format!("{}/transactions", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "products": [{ "product_id": product_id, "serial_numbers": ["SN-404"] }],
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(404, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn completion_failure_rolls_back_already_sold_units() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Partial failure", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001", "SN-002"]).await;

    let txn_id = create_transaction(&app, &client, &product_id, &["SN-001", "SN-002"]).await;

    // SN-002 is taken by someone else between reservation and completion.
    app.db
        .cas_unit_status(&product_id, "SN-002", UnitStatus::InStock, UnitStatus::Sold)
        .await
        .expect("Failed to stage unit state");

    let response = client
        .post(format!("{}/transactions/{}/complete", app.address, txn_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({ "payment_method": "cash", "total_amount_paid": "224" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(422, response.status().as_u16());

    // SN-001 was sold first and then unwound; SN-002 keeps its foreign sale.
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "in_stock");
    assert_eq!(stored_unit_status(&app, &product_id, "SN-002").await, "sold");

    let stored = app
        .db
        .transactions()
        .find_one(doc! { "_id": &txn_id }, None)
        .await
        .unwrap()
        .expect("Transaction not found in DB");
    assert_eq!(stored.status, TransactionStatus::Reserved);

    app.cleanup().await;
}
