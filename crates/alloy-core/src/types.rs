use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle status of a service order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    New,
    InProgress,
    PendingParts,
    PendingApproval,
    Completed,
}

impl WorkStatus {
    /// All statuses in board order.
    pub const ALL: [WorkStatus; 5] = [
        WorkStatus::New,
        WorkStatus::InProgress,
        WorkStatus::PendingParts,
        WorkStatus::PendingApproval,
        WorkStatus::Completed,
    ];

    /// Human-readable label shown on order cards.
    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::New => "New",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::PendingParts => "Pending Parts",
            WorkStatus::PendingApproval => "Pending Approval",
            WorkStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkStatus::New => "new",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::PendingParts => "pending_parts",
            WorkStatus::PendingApproval => "pending_approval",
            WorkStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "new" => Ok(WorkStatus::New),
            "in_progress" => Ok(WorkStatus::InProgress),
            "pending_parts" => Ok(WorkStatus::PendingParts),
            "pending_approval" => Ok(WorkStatus::PendingApproval),
            "completed" => Ok(WorkStatus::Completed),
            other => Err(format!("unknown work status: {other}")),
        }
    }
}

/// Equipment family covered by a service order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemType {
    #[serde(rename = "HVAC")]
    Hvac,
    Projector,
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemType::Hvac => f.write_str("HVAC"),
            SystemType::Projector => f.write_str("Projector"),
        }
    }
}

/// Equipment manufacturer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OemBrand {
    #[serde(rename = "Trox Technik")]
    TroxTechnik,
    Fuji,
    Panasonic,
}

impl fmt::Display for OemBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OemBrand::TroxTechnik => f.write_str("Trox Technik"),
            OemBrand::Fuji => f.write_str("Fuji"),
            OemBrand::Panasonic => f.write_str("Panasonic"),
        }
    }
}

/// Confidence attached to a diagnostic hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

// =============================================================================
// Service orders
// =============================================================================

/// Identifier of a service order, e.g. `WO-1042`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of a `WO-<n>` identifier, if it has one.
    pub fn number(&self) -> Option<u32> {
        self.0.strip_prefix("WO-")?.parse().ok()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Person who reported the issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReporter {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Previous visit on the same equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHistoryEntry {
    pub date: String,
    pub work_order_id: String,
    pub summary: String,
    pub outcome: String,
}

/// Pre-visit diagnosis prepared for the technician.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticHypothesis {
    pub symptom: String,
    pub sub_system_analysis: Vec<String>,
    pub likely_root_cause: String,
    pub confidence: Confidence,
}

/// Part the diagnosis suggests bringing along.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedPart {
    pub name: String,
    pub sku: String,
    pub quantity: u32,
    pub in_stock: bool,
}

/// Tool the technician needs on site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredTool {
    pub name: String,
    pub purpose: String,
}

/// A field service order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: OrderId,
    pub customer: String,
    pub system: SystemType,
    pub oem_brand: OemBrand,
    pub status: WorkStatus,
    pub description: String,
    pub full_detail: String,
    pub location: String,
    pub location_detail: String,
    pub reported_at: String,
    pub reporter: IssueReporter,
    #[serde(default)]
    pub service_history: Vec<ServiceHistoryEntry>,
    pub is_recurring: bool,
    pub hypothesis: DiagnosticHypothesis,
    #[serde(default)]
    pub prior_work: String,
    #[serde(default)]
    pub recommended_parts: Vec<RecommendedPart>,
    #[serde(default)]
    pub required_tools: Vec<RequiredTool>,
    #[serde(default)]
    pub media: Vec<String>,
}

impl ServiceOrder {
    /// Look up one of the order's recommended parts by SKU.
    pub fn recommended_part(&self, sku: &str) -> Option<&RecommendedPart> {
        self.recommended_parts.iter().find(|p| p.sku == sku)
    }
}

/// A service order as submitted from the intake form, before it is numbered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceOrder {
    pub customer: String,
    pub system: SystemType,
    pub oem_brand: OemBrand,
    pub description: String,
    pub full_detail: String,
    pub location: String,
    pub location_detail: String,
    pub reported_at: String,
    pub reporter: IssueReporter,
    pub is_recurring: bool,
    pub hypothesis: DiagnosticHypothesis,
    #[serde(default)]
    pub prior_work: String,
    #[serde(default)]
    pub recommended_parts: Vec<RecommendedPart>,
    #[serde(default)]
    pub required_tools: Vec<RequiredTool>,
}

impl NewServiceOrder {
    /// Number the submission and open it with status `new`.
    pub fn into_order(self, id: OrderId) -> ServiceOrder {
        ServiceOrder {
            id,
            customer: self.customer,
            system: self.system,
            oem_brand: self.oem_brand,
            status: WorkStatus::New,
            description: self.description,
            full_detail: self.full_detail,
            location: self.location,
            location_detail: self.location_detail,
            reported_at: self.reported_at,
            reporter: self.reporter,
            service_history: Vec::new(),
            is_recurring: self.is_recurring,
            hypothesis: self.hypothesis,
            prior_work: self.prior_work,
            recommended_parts: self.recommended_parts,
            required_tools: self.required_tools,
            media: Vec::new(),
        }
    }
}

// =============================================================================
// Identified part
// =============================================================================

/// Inventory record produced when the guided procedure finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedPart {
    pub sku: String,
    pub name: String,
    /// Display label, e.g. `48h`.
    pub lead_time: String,
    /// Display label, e.g. `$1,240.00`.
    pub cost: String,
    pub stock: u32,
}
