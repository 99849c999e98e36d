use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use alloy_core::types::{IdentifiedPart, OrderId, WorkStatus};

use crate::phase::WorkflowPhase;

/// Everything the workflow machine reports after a state change.
///
/// Events are collected by the machine and published by the runtime on a
/// broadcast channel for the UI and for logging.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum WorkflowEvent {
    /// The active phase changed.
    PhaseChanged {
        from: WorkflowPhase,
        to: WorkflowPhase,
    },
    /// The procedure moved on to the next step.
    StepAdvanced { step: usize, total: usize },
    /// The logical mic intent changed.
    MicToggled { active: bool },
    /// A finalized dictation fragment was added to the transcript.
    TranscriptAppended { fragment: String },
    /// A fragment from an earlier session arrived late and was discarded.
    TranscriptFragmentDropped { fragment_generation: u64 },
    /// The transcript was emptied on request.
    TranscriptCleared,
    /// A part was identified at the end of the procedure.
    PartIdentified { part: IdentifiedPart },
    /// A service order was selected for inspection.
    OrderSelected { order_id: OrderId },
    /// Camera/microphone permission state changed.
    PermissionsChanged { granted: bool },
    /// The workflow changed an order's status in the order collection.
    OrderStatusChanged { order_id: OrderId, status: WorkStatus },
}

/// A [`WorkflowEvent`] stamped with identity, time, and the session generation
/// it belongs to.
#[derive(Clone, Debug, Serialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub generation: u64,
    pub event: WorkflowEvent,
}

impl EventRecord {
    pub fn new(generation: u64, event: WorkflowEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            generation,
            event,
        }
    }
}
