use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Order;
use super::services::LineItem;

/// Request body for adding one unit of a product to the cart.
#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
}

/// Request body for editing an order. Attaching a payment type places
/// the order; sending null reopens it.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub payment_type_id: Option<Uuid>,
}

/// An order together with its aggregated line items.
#[derive(Debug, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub line_items: Vec<LineItem>,
}
