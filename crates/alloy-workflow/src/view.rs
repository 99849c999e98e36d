//! Presentation derived from the workflow phase.
//!
//! Pure functions only. Whatever renders the copilot (the CLI today) reads a
//! [`WorkflowSnapshot`] and asks this module what to show.

use serde::Serialize;

use alloy_core::types::IdentifiedPart;

use crate::machine::WorkflowSnapshot;
use crate::phase::WorkflowPhase;

/// The primary view for a phase. Exactly one per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Dashboard with the order list.
    Idle,
    /// Guided procedure with the current step highlighted.
    Procedure,
    /// Procedure view with the identified-part overlay on top.
    PartIdentification,
    /// Job summary.
    Reporting,
}

pub fn select_view(phase: WorkflowPhase) -> ViewKind {
    match phase {
        WorkflowPhase::Idle => ViewKind::Idle,
        WorkflowPhase::Procedure => ViewKind::Procedure,
        WorkflowPhase::PartIdentification => ViewKind::PartIdentification,
        WorkflowPhase::Reporting => ViewKind::Reporting,
    }
}

/// Voice controls (mic toggle, live transcript) are hidden only on the dashboard.
pub fn should_show_voice_controls(phase: WorkflowPhase) -> bool {
    phase != WorkflowPhase::Idle
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub view: ViewKind,
    pub show_voice_controls: bool,
    pub mic_indicator: &'static str,
    /// "Step n of m" while a step is active.
    pub step_label: Option<String>,
    pub current_step: Option<String>,
    /// Present only while the part overlay is up.
    pub part_overlay: Option<IdentifiedPart>,
    pub transcript: String,
}

impl ViewModel {
    pub fn from_snapshot(snapshot: &WorkflowSnapshot) -> Self {
        let view = select_view(snapshot.phase);
        let in_procedure_view = matches!(view, ViewKind::Procedure | ViewKind::PartIdentification);

        let step_label = in_procedure_view
            .then(|| format!("Step {} of {}", snapshot.active_step + 1, snapshot.step_count));
        let current_step = if in_procedure_view {
            snapshot.current_step.clone()
        } else {
            None
        };
        let part_overlay = if view == ViewKind::PartIdentification {
            snapshot.identified_part.clone()
        } else {
            None
        };

        Self {
            view,
            show_voice_controls: should_show_voice_controls(snapshot.phase),
            mic_indicator: if snapshot.is_mic_active { "LISTENING" } else { "MUTED" },
            step_label,
            current_step,
            part_overlay,
            transcript: snapshot.transcript.clone(),
        }
    }
}
