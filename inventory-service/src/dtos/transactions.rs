use crate::models::{PaymentStatus, Transaction, TransactionLine, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TransactionLineRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    #[validate(length(min = 1))]
    pub serial_numbers: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1), nested)]
    pub products: Vec<TransactionLineRequest>,
    pub discount: Option<Decimal>,
    pub customer_id: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteTransactionRequest {
    #[validate(length(min = 1))]
    pub payment_method: String,
    pub total_amount_paid: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransactionListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub transaction_id: String,
    pub products: Vec<TransactionLine>,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
    pub vat: Decimal,
    pub discount: Decimal,
    pub total_amount_paid: Decimal,
    pub amount_due: Decimal,
    pub reference_number: Option<String>,
    pub customer_id: Option<String>,
    pub cashier: String,
    pub transaction_date: String,
    pub created_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        let amount_due = txn.amount_due();
        Self {
            id: txn.id,
            transaction_id: txn.transaction_id,
            products: txn.products,
            status: txn.status,
            payment_status: txn.payment_status,
            payment_method: txn.payment_method,
            total_price: txn.total_price,
            vat: txn.vat,
            discount: txn.discount,
            total_amount_paid: txn.total_amount_paid,
            amount_due,
            reference_number: txn.reference_number,
            customer_id: txn.customer_id,
            cashier: txn.cashier,
            transaction_date: txn.transaction_date.to_rfc3339(),
            created_at: txn.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
