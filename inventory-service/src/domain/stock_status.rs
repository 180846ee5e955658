//! Aggregate stock-status classification.
//!
//! Every consumer (product listing, dashboard summary, low-stock reporting)
//! derives a product's status from `classify`; nothing else recomputes the
//! bands.

use crate::models::Product;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    High,
    NearLow,
    Low,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::High => "HIGH",
            StockStatus::NearLow => "NEAR_LOW",
            StockStatus::Low => "LOW",
            StockStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bring legacy threshold values into a usable range.
///
/// Negative values become 0 and an inverted pair is flattened so that
/// `low <= near_low`. Misconfiguration is logged, never an error.
fn sanitize_thresholds(low: i64, near_low: i64) -> (u64, u64) {
    let (mut low_s, mut near_low_s) = (low, near_low);
    if low_s < 0 || near_low_s < 0 {
        tracing::warn!(
            low = low,
            near_low = near_low,
            "Negative stock threshold, treating as 0"
        );
        low_s = low_s.max(0);
        near_low_s = near_low_s.max(0);
    }
    if low_s > near_low_s {
        tracing::warn!(
            low = low,
            near_low = near_low,
            "Inverted stock thresholds, raising near-low to low"
        );
        near_low_s = low_s;
    }
    (low_s as u64, near_low_s as u64)
}

/// Classify availability into one of four statuses.
///
/// Total over all inputs and idempotent; the four bands partition the
/// non-negative integers:
///
///   available == 0                      -> OUT_OF_STOCK
///   0 < available <= low                -> LOW
///   low < available <= near_low         -> NEAR_LOW
///   available > near_low                -> HIGH
pub fn classify(available: u64, low_stock_threshold: i64, near_low_stock_threshold: i64) -> StockStatus {
    let (low, near_low) = sanitize_thresholds(low_stock_threshold, near_low_stock_threshold);

    if available == 0 {
        StockStatus::OutOfStock
    } else if available <= low {
        StockStatus::Low
    } else if available <= near_low {
        StockStatus::NearLow
    } else {
        StockStatus::High
    }
}

/// Classify a product from its embedded units and configured thresholds.
pub fn product_stock_status(product: &Product) -> StockStatus {
    classify(
        product.available(),
        product.low_stock_threshold,
        product.near_low_stock_threshold,
    )
}
