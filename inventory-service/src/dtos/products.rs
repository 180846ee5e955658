use crate::domain::{product_stock_status, StockStatus};
use crate::models::{Product, Unit, UnitStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub model: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub low_stock_threshold: i64,
    pub near_low_stock_threshold: i64,
    pub supplier_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewUnitRequest {
    #[validate(length(min = 1))]
    pub serial_number: String,
    pub serial_number_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddUnitsRequest {
    #[validate(length(min = 1), nested)]
    pub units: Vec<NewUnitRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThresholdsRequest {
    pub low_stock_threshold: i64,
    pub near_low_stock_threshold: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub category: Option<String>,
    pub stock_status: Option<StockStatus>,
}

#[derive(Debug, Serialize)]
pub struct UnitResponse {
    pub serial_number: String,
    pub status: UnitStatus,
    pub serial_number_image: Option<String>,
}

impl From<Unit> for UnitResponse {
    fn from(unit: Unit) -> Self {
        Self {
            serial_number: unit.serial_number,
            status: unit.status,
            serial_number_image: unit.serial_number_image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub model: String,
    pub buying_price: Decimal,
    pub selling_price: Decimal,
    pub low_stock_threshold: i64,
    pub near_low_stock_threshold: i64,
    pub supplier_id: Option<String>,
    pub available: u64,
    pub stock_status: StockStatus,
    pub units: Vec<UnitResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let stock_status = product_stock_status(&product);
        let available = product.available();
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            model: product.model,
            buying_price: product.buying_price,
            selling_price: product.selling_price,
            low_stock_threshold: product.low_stock_threshold,
            near_low_stock_threshold: product.near_low_stock_threshold,
            supplier_id: product.supplier_id,
            available,
            stock_status,
            units: product.units.into_iter().map(UnitResponse::from).collect(),
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}
