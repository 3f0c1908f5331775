use serde::Deserialize;

/// Request body for registering a payment type.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentTypeRequest {
    pub description: String,
    pub account_number: String,
}

/// Request body for editing a payment type.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentTypeRequest {
    pub description: String,
    pub account_number: String,
}
