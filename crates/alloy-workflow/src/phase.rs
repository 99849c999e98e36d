//! Workflow phases and the transitions allowed between them.
//!
//! - Idle -> Procedure (begin inspection)
//! - Procedure -> PartIdentification (last step advanced, or explicit trigger)
//! - PartIdentification -> Reporting (job authorized)
//! - any -> Idle (reset)

use std::fmt;

use serde::{Deserialize, Serialize};

/// The single active mode of the copilot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// No inspection running. An order can be selected and started.
    #[default]
    Idle,
    /// Stepping through the guided procedure with dictation on.
    Procedure,
    /// Procedure finished; an identified part is on screen.
    PartIdentification,
    /// Job authorized; the report is being wrapped up.
    Reporting,
}

impl WorkflowPhase {
    pub const ALL: [WorkflowPhase; 4] = [
        WorkflowPhase::Idle,
        WorkflowPhase::Procedure,
        WorkflowPhase::PartIdentification,
        WorkflowPhase::Reporting,
    ];

    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &WorkflowPhase) -> bool {
        matches!(
            (self, target),
            (WorkflowPhase::Idle, WorkflowPhase::Procedure)
                | (WorkflowPhase::Procedure, WorkflowPhase::PartIdentification)
                | (WorkflowPhase::PartIdentification, WorkflowPhase::Reporting)
                // Reset
                | (_, WorkflowPhase::Idle)
        )
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowPhase::Idle => write!(f, "idle"),
            WorkflowPhase::Procedure => write!(f, "procedure"),
            WorkflowPhase::PartIdentification => write!(f, "part_identification"),
            WorkflowPhase::Reporting => write!(f, "reporting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(WorkflowPhase::Idle.to_string(), "idle");
        assert_eq!(WorkflowPhase::Procedure.to_string(), "procedure");
        assert_eq!(
            WorkflowPhase::PartIdentification.to_string(),
            "part_identification"
        );
        assert_eq!(WorkflowPhase::Reporting.to_string(), "reporting");
    }

    #[test]
    fn test_forward_transitions() {
        assert!(WorkflowPhase::Idle.can_transition_to(&WorkflowPhase::Procedure));
        assert!(WorkflowPhase::Procedure.can_transition_to(&WorkflowPhase::PartIdentification));
        assert!(WorkflowPhase::PartIdentification.can_transition_to(&WorkflowPhase::Reporting));
    }

    #[test]
    fn test_reset_allowed_from_every_phase() {
        for phase in WorkflowPhase::ALL {
            assert!(phase.can_transition_to(&WorkflowPhase::Idle), "{phase} -> idle");
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!WorkflowPhase::Idle.can_transition_to(&WorkflowPhase::PartIdentification));
        assert!(!WorkflowPhase::Idle.can_transition_to(&WorkflowPhase::Reporting));
        assert!(!WorkflowPhase::Procedure.can_transition_to(&WorkflowPhase::Reporting));
        assert!(!WorkflowPhase::Reporting.can_transition_to(&WorkflowPhase::Procedure));
        assert!(!WorkflowPhase::PartIdentification.can_transition_to(&WorkflowPhase::Procedure));
        assert!(!WorkflowPhase::Reporting.can_transition_to(&WorkflowPhase::PartIdentification));
    }

    #[test]
    fn test_all_valid_transitions_count() {
        let mut valid = 0;
        for from in WorkflowPhase::ALL {
            for to in WorkflowPhase::ALL {
                if from.can_transition_to(&to) {
                    valid += 1;
                }
            }
        }
        // Three forward edges plus reset from each of the four phases.
        assert_eq!(valid, 7);
    }

    #[test]
    fn test_phase_serde() {
        let json = serde_json::to_string(&WorkflowPhase::PartIdentification).unwrap();
        assert_eq!(json, "\"part_identification\"");
    }
}
