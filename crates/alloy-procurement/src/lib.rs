//! AlloyPro Procurement crate - turns an identified part into a purchase
//! request for a purchasing assistant.
//!
//! Placing an order never fails the technician's flow. Backend errors are
//! logged and reported as a warning on an otherwise successful outcome.

pub mod backend;
pub mod error;
pub mod request;

use serde::Serialize;
use serde_json::Value;

pub use backend::{backend_from_config, HttpProcurementBackend, LoggingBackend, ProcurementBackend};
pub use error::ProcurementError;
pub use request::PurchaseRequest;

/// Result reported back to the UI after a purchase attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseOutcome {
    /// Always true.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Submit `request`, downgrading any backend failure to a warning.
pub async fn place_purchase_order(
    backend: &dyn ProcurementBackend,
    request: &PurchaseRequest,
) -> PurchaseOutcome {
    match backend.submit(request).await {
        Ok(data) => {
            tracing::info!(order_id = %request.order_id, sku = %request.sku, "Purchase request placed");
            PurchaseOutcome {
                success: true,
                warning: None,
                data: Some(data),
            }
        }
        Err(e) => {
            tracing::error!(order_id = %request.order_id, sku = %request.sku, error = %e, "Purchase request failed");
            let warning = match e {
                ProcurementError::InvalidResponse(_) => "Could not parse procurement response.",
                ProcurementError::Rejected { .. } => {
                    "Procurement endpoint failed, but the job continues."
                }
                _ => "Procurement request could not be sent, but the job continues.",
            };
            PurchaseOutcome {
                success: true,
                warning: Some(warning.to_string()),
                data: None,
            }
        }
    }
}
