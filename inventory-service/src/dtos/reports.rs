use crate::domain::StockStatus;
use serde::Serialize;

/// One product needing attention on the dashboard.
#[derive(Debug, Serialize)]
pub struct StockAlert {
    pub product_id: String,
    pub name: String,
    pub available: u64,
    pub stock_status: StockStatus,
}

#[derive(Debug, Serialize)]
pub struct StockSummaryResponse {
    pub total_products: u64,
    pub high: u64,
    pub near_low: u64,
    pub low: u64,
    pub out_of_stock: u64,
    /// LOW and OUT_OF_STOCK products, for the low-stock alert panel.
    pub attention: Vec<StockAlert>,
}
