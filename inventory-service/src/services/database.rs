use crate::domain::DomainError;
use crate::models::{
    AuditLog, Customer, Product, Refund, RmaRequest, RmaStatus, Transaction, TransactionStatus,
    UnitStatus,
};
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for inventory-service");

        // Multikey index for serial lookups across embedded units.
        let serial_index = IndexModel::builder()
            .keys(doc! { "units.serial_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("unit_serial_lookup".to_string())
                    .build(),
            )
            .build();
        self.products()
            .create_index(serial_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create serial index on products: {}", e);
                AppError::from(e)
            })?;

        let txn_index = IndexModel::builder()
            .keys(doc! { "transaction_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("transaction_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.transactions()
            .create_index(txn_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create transaction_id index: {}", e);
                AppError::from(e)
            })?;

        let rma_index = IndexModel::builder()
            .keys(doc! { "rma_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("rma_id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.rmas().create_index(rma_index, None).await.map_err(|e| {
            tracing::error!("Failed to create rma_id index: {}", e);
            AppError::from(e)
        })?;

        let audit_index = IndexModel::builder()
            .keys(doc! { "module": 1, "timestamp": -1 })
            .options(
                IndexOptions::builder()
                    .name("audit_module_time".to_string())
                    .build(),
            )
            .build();
        self.audit_logs()
            .create_index(audit_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create audit index: {}", e);
                AppError::from(e)
            })?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    pub fn transactions(&self) -> Collection<Transaction> {
        self.db.collection("transactions")
    }

    pub fn rmas(&self) -> Collection<RmaRequest> {
        self.db.collection("rmas")
    }

    pub fn refunds(&self) -> Collection<Refund> {
        self.db.collection("refunds")
    }

    pub fn audit_logs(&self) -> Collection<AuditLog> {
        self.db.collection("audit_logs")
    }

    pub fn customers(&self) -> Collection<Customer> {
        self.db.collection("customers")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Conditional (compare-and-swap) updates
    //
    // Every status mutation is keyed on the expected current status so a
    // concurrent writer loses with StaleEntityState instead of clobbering.
    // =========================================================================

    /// Flip one embedded unit's status, guarded on its expected current status.
    pub async fn cas_unit_status(
        &self,
        product_id: &str,
        serial: &str,
        expected: UnitStatus,
        to: UnitStatus,
    ) -> Result<(), AppError> {
        let result = self
            .products()
            .update_one(
                doc! {
                    "_id": product_id,
                    "units": {
                        "$elemMatch": {
                            "serial_number": serial,
                            "status": expected.as_str(),
                        }
                    }
                },
                doc! {
                    "$set": {
                        "units.$.status": to.as_str(),
                        "updated_at": mongodb::bson::DateTime::now(),
                    }
                },
                None,
            )
            .await
            .map_err(AppError::from)?;

        if result.modified_count == 1 {
            return Ok(());
        }
        self.explain_unit_miss(product_id, serial).await
    }

    /// Tell a vanished entity apart from a lost race.
    async fn explain_unit_miss(&self, product_id: &str, serial: &str) -> Result<(), AppError> {
        let product = self
            .products()
            .find_one(doc! { "_id": product_id }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product {} not found", product_id)))?;

        if product.unit(serial).is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Unit {} not found on product {}",
                serial,
                product_id
            )));
        }

        Err(DomainError::StaleEntityState {
            entity: "unit",
            id: serial.to_string(),
        }
        .into())
    }

    /// Apply `set` to a transaction, guarded on its expected current status.
    pub async fn cas_transaction(
        &self,
        id: &str,
        expected: TransactionStatus,
        set: Document,
    ) -> Result<(), AppError> {
        let result = self
            .transactions()
            .update_one(
                doc! { "_id": id, "status": expected.as_str() },
                doc! { "$set": set },
                None,
            )
            .await
            .map_err(AppError::from)?;

        if result.modified_count == 1 {
            return Ok(());
        }

        self.transactions()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction {} not found", id)))?;

        Err(DomainError::StaleEntityState {
            entity: "transaction",
            id: id.to_string(),
        }
        .into())
    }

    /// Apply `set` to an RMA request, guarded on its expected current status.
    pub async fn cas_rma(
        &self,
        id: &str,
        expected: RmaStatus,
        mut set: Document,
    ) -> Result<(), AppError> {
        set.insert("updated_at", mongodb::bson::DateTime::now());
        let result = self
            .rmas()
            .update_one(
                doc! { "_id": id, "status": expected.as_str() },
                doc! { "$set": set },
                None,
            )
            .await
            .map_err(AppError::from)?;

        if result.modified_count == 1 {
            return Ok(());
        }

        self.rmas()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("RMA {} not found", id)))?;

        Err(DomainError::StaleEntityState {
            entity: "rma",
            id: id.to_string(),
        }
        .into())
    }

    /// Append new units to a product. Serial uniqueness within the product
    /// is checked by the caller against the fetched document.
    pub async fn push_units(
        &self,
        product_id: &str,
        units: &[crate::models::Unit],
    ) -> Result<(), AppError> {
        let docs: Vec<Document> = units
            .iter()
            .map(|u| {
                mongodb::bson::to_document(u).map_err(|e| {
                    AppError::InternalError(anyhow::anyhow!("Failed to serialize unit: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        let result = self
            .products()
            .update_one(
                doc! { "_id": product_id },
                doc! {
                    "$push": { "units": { "$each": docs } },
                    "$set": { "updated_at": mongodb::bson::DateTime::now() },
                },
                None,
            )
            .await
            .map_err(AppError::from)?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Product {} not found",
                product_id
            )));
        }
        Ok(())
    }

    /// Remove one unit by serial. Only used to unwind a provisioned
    /// replacement when a later step of the same operation fails.
    pub async fn pull_unit(&self, product_id: &str, serial: &str) -> Result<(), AppError> {
        self.products()
            .update_one(
                doc! { "_id": product_id },
                doc! {
                    "$pull": { "units": { "serial_number": serial } },
                    "$set": { "updated_at": mongodb::bson::DateTime::now() },
                },
                None,
            )
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
