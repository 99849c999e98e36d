use alloy_core::error::AlloyError;
use alloy_core::types::OrderId;

/// Failures talking to the purchasing assistant.
///
/// Only [`ProcurementError::UnknownPart`] ever reaches the caller of
/// [`crate::place_purchase_order`]; everything else is downgraded to a warning.
#[derive(Debug, thiserror::Error)]
pub enum ProcurementError {
    #[error("Order {order_id} has no recommended part with SKU {sku}")]
    UnknownPart { order_id: OrderId, sku: String },
    #[error("Procurement request failed: {0}")]
    Request(String),
    #[error("Procurement endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Could not parse procurement response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProcurementError {
    fn from(err: reqwest::Error) -> Self {
        ProcurementError::Request(err.to_string())
    }
}

impl From<ProcurementError> for AlloyError {
    fn from(err: ProcurementError) -> Self {
        AlloyError::Procurement(err.to_string())
    }
}
