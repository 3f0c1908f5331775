use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Request body for listing a new product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub product_type_id: Uuid,
    pub city: Option<String>,
    pub image_url: Option<String>,
}

/// Request body for editing a product. Product type and owner are not
/// editable.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    pub city: Option<String>,
    pub image_url: Option<String>,
}
