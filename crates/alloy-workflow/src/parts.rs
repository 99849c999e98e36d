//! Part identification at the end of the guided procedure.

use alloy_core::types::{IdentifiedPart, ServiceOrder};

/// Produces the part record shown once the procedure completes.
///
/// A vision or inventory service would sit behind this; the default is a
/// deterministic placeholder.
pub trait PartIdentifier: Send + Sync {
    fn identify(&self, order: Option<&ServiceOrder>) -> IdentifiedPart;
}

/// Always identifies the same valve array.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderIdentifier;

impl PartIdentifier for PlaceholderIdentifier {
    fn identify(&self, _order: Option<&ServiceOrder>) -> IdentifiedPart {
        IdentifiedPart {
            sku: "SKU-992".to_string(),
            name: "VALVE_ARRAY_04".to_string(),
            lead_time: "48h".to_string(),
            cost: "$1,240.00".to_string(),
            stock: 4,
        }
    }
}
