use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// VAT rate applied once at transaction creation (12%).
pub fn vat_rate() -> Decimal {
    Decimal::new(12, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Reserved,
    Completed,
    Refunded,
    #[serde(rename = "RMA")]
    Rma,
    Replaced,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Reserved => "Reserved",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Refunded => "Refunded",
            TransactionStatus::Rma => "RMA",
            TransactionStatus::Replaced => "Replaced",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// One line of a transaction: a subset of a product's units snapshotted by
/// serial number, with the selling price frozen at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    pub product_id: String,
    pub quantity: i64,
    pub serial_numbers: Vec<String>,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub transaction_id: String,
    pub products: Vec<TransactionLine>,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    /// Ex-VAT subtotal.
    pub total_price: Decimal,
    pub vat: Decimal,
    pub discount: Decimal,
    pub total_amount_paid: Decimal,
    pub reference_number: Option<String>,
    pub customer_id: Option<String>,
    pub cashier: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub transaction_date: DateTime<Utc>,
    pub due_date: Option<mongodb::bson::DateTime>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        products: Vec<TransactionLine>,
        discount: Decimal,
        customer_id: Option<String>,
        cashier: String,
        reference_number: Option<String>,
        due_date: Option<mongodb::bson::DateTime>,
    ) -> Self {
        let subtotal: Decimal = products
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id: format!("TXN-{:08X}", rand::random::<u32>()),
            products,
            status: TransactionStatus::Reserved,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            total_price: subtotal,
            vat: subtotal * vat_rate(),
            discount,
            total_amount_paid: Decimal::ZERO,
            reference_number,
            customer_id,
            cashier,
            transaction_date: now,
            due_date,
            created_at: now,
        }
    }

    /// Amount owed by the customer: subtotal minus discount, plus VAT.
    pub fn amount_due(&self) -> Decimal {
        self.total_price - self.discount + self.vat
    }

    pub fn line(&self, product_id: &str) -> Option<&TransactionLine> {
        self.products.iter().find(|l| l.product_id == product_id)
    }
}
