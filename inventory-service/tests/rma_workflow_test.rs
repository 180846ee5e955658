mod common;

use common::{
    add_units, complete_transaction, create_product, create_transaction, stored_unit_status,
    TestApp, TEST_USER_ID,
};
use mongodb::bson::doc;
use reqwest::Client;
use serde_json::json;

/// Sell SN-001 of a fresh product and open an RMA for it.
/// Returns (product_id, rma document id).
async fn sold_unit_with_rma(app: &TestApp, client: &Client, warranty: &str) -> (String, String) {
    let product_id = create_product(app, client, "RMA candidate", 1, 2).await;
    add_units(app, client, &product_id, &["SN-001", "SN-002"]).await;

    let txn_id = create_transaction(app, client, &product_id, &["SN-001"]).await;
    complete_transaction(app, client, &txn_id).await;

    let response = client
        .post(format!("{}/rmas", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "transaction_id": txn_id,
            "product_id": product_id,
            "serial_number": "SN-001",
            "customer_name": "Jo Cruz",
            "reason": "Dead on arrival",
            "warranty_status": warranty,
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Pending");
    let rma_id = body["id"].as_str().expect("RMA id missing").to_string();
    (product_id, rma_id)
}

async fn patch_rma(
    app: &TestApp,
    client: &Client,
    rma_id: &str,
    payload: serde_json::Value,
) -> reqwest::Response {
    client
        .patch(format!("{}/rmas/{}/status", app.address, rma_id))
        .header("X-User-ID", TEST_USER_ID)
        .json(&payload)
        .send()
        .await
        .expect("Failed to execute request")
}

async fn rma_audit_count(app: &TestApp) -> u64 {
    app.db
        .audit_logs()
        .count_documents(doc! { "module": "RMA" }, None)
        .await
        .unwrap()
}

#[tokio::test]
async fn approving_an_rma_moves_the_unit_and_writes_one_audit_entry() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    let response = patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" })).await;
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Approved");

    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "rma");

    // Exactly one audit entry, carrying only the status diff.
    assert_eq!(rma_audit_count(&app).await, 1);
    let entry = app
        .db
        .audit_logs()
        .find_one(doc! { "module": "RMA" }, None)
        .await
        .unwrap()
        .expect("Audit entry not found");
    assert_eq!(entry.user, TEST_USER_ID);
    assert_eq!(entry.action, "UPDATE");
    assert_eq!(entry.previous_value.get_str("status").unwrap(), "Pending");
    assert_eq!(entry.updated_value.get_str("status").unwrap(), "Approved");
    assert!(!entry.previous_value.contains_key("notes"));
    assert!(!entry.previous_value.contains_key("process"));

    app.cleanup().await;
}

#[tokio::test]
async fn an_approved_rma_cannot_be_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    let response = patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" })).await;
    assert_eq!(200, response.status().as_u16());

    let response = patch_rma(&app, &client, &rma_id, json!({ "status": "Rejected" })).await;
    assert_eq!(422, response.status().as_u16());

    // The rejected attempt changed nothing and left no audit trail.
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "rma");
    assert_eq!(rma_audit_count(&app).await, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn expired_warranty_blocks_approval_but_not_rejection() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Expired").await;

    let response = patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" })).await;
    assert_eq!(422, response.status().as_u16());
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "sold");

    let response = patch_rma(&app, &client, &rma_id, json!({ "status": "Rejected" })).await;
    assert_eq!(200, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn replace_resolution_swaps_in_a_sold_replacement() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" }))
            .await
            .status()
            .as_u16()
    );
    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "In Progress" }))
            .await
            .status()
            .as_u16()
    );

    let response = patch_rma(
        &app,
        &client,
        &rma_id,
        json!({
            "status": "Completed",
            "process": "Replace",
            "replacement_serial_number": "SN-REP",
        }),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["process"], "Replace");

    // Original unit settles at replace; the replacement goes straight to the
    // customer as sold.
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "replace");
    assert_eq!(stored_unit_status(&app, &product_id, "SN-REP").await, "sold");

    // Three transitions, three audit entries.
    assert_eq!(rma_audit_count(&app).await, 3);

    app.cleanup().await;
}

#[tokio::test]
async fn repair_resolution_returns_the_unit_to_sold() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    for payload in [
        json!({ "status": "Approved" }),
        json!({ "status": "In Progress" }),
        json!({ "status": "Completed", "process": "Repair" }),
    ] {
        assert_eq!(
            200,
            patch_rma(&app, &client, &rma_id, payload)
                .await
                .status()
                .as_u16()
        );
    }

    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "sold");

    app.cleanup().await;
}

#[tokio::test]
async fn replace_without_replacement_serial_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" }))
            .await
            .status()
            .as_u16()
    );
    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "In Progress" }))
            .await
            .status()
            .as_u16()
    );

    let response = patch_rma(
        &app,
        &client,
        &rma_id,
        json!({ "status": "Completed", "process": "Replace" }),
    )
    .await;
    assert_eq!(400, response.status().as_u16());

    // The failed completion left the unit and the request untouched.
    assert_eq!(stored_unit_status(&app, &product_id, "SN-001").await, "rma");
    let stored = app
        .db
        .rmas()
        .find_one(doc! { "_id": &rma_id }, None)
        .await
        .unwrap()
        .expect("RMA not found in DB");
    assert_eq!(stored.status.as_str(), "In Progress");

    app.cleanup().await;
}

#[tokio::test]
async fn notes_only_update_audits_only_notes() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (_product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    let response = patch_rma(
        &app,
        &client,
        &rma_id,
        json!({ "notes": "Customer will drop the unit off on Monday" }),
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["notes"], "Customer will drop the unit off on Monday");

    assert_eq!(rma_audit_count(&app).await, 1);
    let entry = app
        .db
        .audit_logs()
        .find_one(doc! { "module": "RMA" }, None)
        .await
        .unwrap()
        .expect("Audit entry not found");
    assert!(!entry.updated_value.contains_key("status"));
    assert_eq!(entry.previous_value.get_str("notes").unwrap(), "");
    assert_eq!(
        entry.updated_value.get_str("notes").unwrap(),
        "Customer will drop the unit off on Monday"
    );

    app.cleanup().await;
}

#[tokio::test]
async fn terminal_rmas_reject_any_further_edit() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (_product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;

    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "Rejected" }))
            .await
            .status()
            .as_u16()
    );

    let response = patch_rma(&app, &client, &rma_id, json!({ "notes": "late note" })).await;
    assert_eq!(422, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn rma_requires_a_serial_from_the_transaction() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let product_id = create_product(&app, &client, "Wrong serial", 1, 2).await;
    add_units(&app, &client, &product_id, &["SN-001", "SN-002"]).await;

    let txn_id = create_transaction(&app, &client, &product_id, &["SN-001"]).await;
    complete_transaction(&app, &client, &txn_id).await;

    let response = client
        .post(format!("{}/rmas", app.address))
        .header("X-User-ID", TEST_USER_ID)
        .json(&json!({
            "transaction_id": txn_id,
            "product_id": product_id,
            "serial_number": "SN-002",
            "customer_name": "Jo Cruz",
            "reason": "Not my unit",
            "warranty_status": "Valid",
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(400, response.status().as_u16());

    app.cleanup().await;
}

#[tokio::test]
async fn audit_log_listing_filters_by_module() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let (_product_id, rma_id) = sold_unit_with_rma(&app, &client, "Valid").await;
    assert_eq!(
        200,
        patch_rma(&app, &client, &rma_id, json!({ "status": "Approved" }))
            .await
            .status()
            .as_u16()
    );

    let response = client
        .get(format!("{}/audit-logs?module=RMA", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["total"], 1);
    assert_eq!(body["logs"][0]["module"], "RMA");
    assert_eq!(body["logs"][0]["updated_value"]["status"], "Approved");

    app.cleanup().await;
}
