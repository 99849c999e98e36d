use serde::Serialize;

use alloy_core::types::{OrderId, RecommendedPart, ServiceOrder};

use crate::error::ProcurementError;

/// Everything the purchasing assistant needs to place one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRequest {
    pub order_id: OrderId,
    pub customer: String,
    pub equipment: String,
    pub oem_brand: String,
    pub part_name: String,
    pub sku: String,
    pub quantity: u32,
    pub reporter: String,
}

impl PurchaseRequest {
    pub fn from_order(order: &ServiceOrder, part: &RecommendedPart) -> Self {
        Self {
            order_id: order.id.clone(),
            customer: order.customer.clone(),
            equipment: order.system.to_string(),
            oem_brand: order.oem_brand.to_string(),
            part_name: part.name.clone(),
            sku: part.sku.clone(),
            quantity: part.quantity,
            reporter: order.reporter.name.clone(),
        }
    }

    /// Build a request for one of the order's recommended parts.
    pub fn for_sku(order: &ServiceOrder, sku: &str) -> Result<Self, ProcurementError> {
        order
            .recommended_part(sku)
            .map(|part| Self::from_order(order, part))
            .ok_or_else(|| ProcurementError::UnknownPart {
                order_id: order.id.clone(),
                sku: sku.to_string(),
            })
    }

    /// Message sent to the assistant.
    pub fn prompt(&self) -> String {
        format!(
            "Please place a purchase order for the following diagnostic task:\n\
             Order Reference: {}\n\
             Customer: {}\n\
             Equipment: {} ({})\n\
             Required Part: {} (SKU: {}, Qty: {})\n\
             Reporter: {}",
            self.order_id,
            self.customer,
            self.equipment,
            self.oem_brand,
            self.part_name,
            self.sku,
            self.quantity,
            self.reporter,
        )
    }
}
