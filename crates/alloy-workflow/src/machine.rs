//! Inspection workflow state machine.
//!
//! Holds the current phase, the position within the procedure script, the
//! logical mic intent, the identified part, and the accumulated dictation
//! transcript. All mutation goes through `&mut self`, so a single owner
//! (see [`crate::runtime`]) serializes every update.
//!
//! Every `begin_inspection` and `reset_workflow` starts a new generation.
//! Transcript fragments tagged with an older generation are dropped, so
//! nothing recognized before one of those boundaries lands after it.

use std::sync::Arc;

use serde::Serialize;

use alloy_core::config::ProcedureConfig;
use alloy_core::orders::OrderProvider;
use alloy_core::types::{IdentifiedPart, OrderId, ServiceOrder, WorkStatus};

use crate::error::WorkflowError;
use crate::events::WorkflowEvent;
use crate::parts::{PartIdentifier, PlaceholderIdentifier};
use crate::phase::WorkflowPhase;

/// Ordered, non-empty list of inspection steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureScript {
    steps: Vec<String>,
}

impl ProcedureScript {
    pub fn new(steps: Vec<String>) -> Result<Self, WorkflowError> {
        if steps.is_empty() {
            return Err(WorkflowError::EmptyProcedure);
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn step(&self, index: usize) -> Option<&str> {
        self.steps.get(index).map(String::as_str)
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }
}

impl Default for ProcedureScript {
    fn default() -> Self {
        Self {
            steps: ProcedureConfig::default().steps,
        }
    }
}

impl TryFrom<&ProcedureConfig> for ProcedureScript {
    type Error = WorkflowError;

    fn try_from(config: &ProcedureConfig) -> Result<Self, Self::Error> {
        Self::new(config.steps.clone())
    }
}

/// Read-only copy of the machine state, published after every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowPhase,
    pub active_step: usize,
    pub step_count: usize,
    pub current_step: Option<String>,
    pub is_mic_active: bool,
    pub identified_part: Option<IdentifiedPart>,
    pub transcript: String,
    pub selected_order: Option<OrderId>,
    pub has_permissions: bool,
    pub generation: u64,
}

/// The inspection workflow.
pub struct WorkflowMachine {
    phase: WorkflowPhase,
    active_step: usize,
    is_mic_active: bool,
    identified_part: Option<IdentifiedPart>,
    transcript: String,
    selected_order: Option<OrderId>,
    has_permissions: bool,
    generation: u64,
    script: ProcedureScript,
    orders: Arc<dyn OrderProvider>,
    parts: Box<dyn PartIdentifier>,
    outbox: Vec<WorkflowEvent>,
}

impl std::fmt::Debug for WorkflowMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowMachine")
            .field("phase", &self.phase)
            .field("active_step", &self.active_step)
            .field("is_mic_active", &self.is_mic_active)
            .field("selected_order", &self.selected_order)
            .field("generation", &self.generation)
            .finish()
    }
}

impl WorkflowMachine {
    /// Create a machine in the idle state with the placeholder part identifier.
    pub fn new(script: ProcedureScript, orders: Arc<dyn OrderProvider>) -> Self {
        Self::with_identifier(script, orders, Box::new(PlaceholderIdentifier))
    }

    pub fn with_identifier(
        script: ProcedureScript,
        orders: Arc<dyn OrderProvider>,
        parts: Box<dyn PartIdentifier>,
    ) -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            active_step: 0,
            is_mic_active: false,
            identified_part: None,
            transcript: String::new(),
            selected_order: None,
            has_permissions: false,
            generation: 0,
            script,
            orders,
            parts,
            outbox: Vec::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn is_mic_active(&self) -> bool {
        self.is_mic_active
    }

    pub fn identified_part(&self) -> Option<&IdentifiedPart> {
        self.identified_part.as_ref()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn has_permissions(&self) -> bool {
        self.has_permissions
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn script(&self) -> &ProcedureScript {
        &self.script
    }

    pub fn selected_order_id(&self) -> Option<&OrderId> {
        self.selected_order.as_ref()
    }

    /// The selected order as currently held by the order collection.
    pub fn selected_order(&self) -> Option<ServiceOrder> {
        self.selected_order.as_ref().and_then(|id| self.orders.get(id))
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            phase: self.phase,
            active_step: self.active_step,
            step_count: self.script.len(),
            current_step: self.script.step(self.active_step).map(str::to_string),
            is_mic_active: self.is_mic_active,
            identified_part: self.identified_part.clone(),
            transcript: self.transcript.clone(),
            selected_order: self.selected_order.clone(),
            has_permissions: self.has_permissions,
            generation: self.generation,
        }
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.outbox)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    pub fn set_permissions(&mut self, granted: bool) {
        if self.has_permissions != granted {
            self.has_permissions = granted;
            self.outbox.push(WorkflowEvent::PermissionsChanged { granted });
        }
    }

    /// Select the order to inspect. Does not change phase.
    pub fn select_order(&mut self, id: OrderId) -> Result<(), WorkflowError> {
        if self.orders.get(&id).is_none() {
            return Err(WorkflowError::UnknownOrder(id));
        }
        tracing::debug!(order_id = %id, "Order selected");
        self.selected_order = Some(id.clone());
        self.outbox.push(WorkflowEvent::OrderSelected { order_id: id });
        Ok(())
    }

    /// Start the guided procedure for the selected order.
    ///
    /// Without a selected order this is a silent no-op. Permission gating is
    /// left to the caller.
    pub fn begin_inspection(&mut self) -> Result<(), WorkflowError> {
        let Some(order_id) = self.selected_order.clone() else {
            tracing::debug!("begin_inspection ignored: no order selected");
            return Ok(());
        };
        self.ensure_transition(WorkflowPhase::Procedure)?;

        self.generation += 1;
        self.active_step = 0;
        self.transcript.clear();
        self.set_mic(true);
        self.enter(WorkflowPhase::Procedure);

        match self.orders.set_status(&order_id, WorkStatus::InProgress) {
            Ok(true) => self.outbox.push(WorkflowEvent::OrderStatusChanged {
                order_id: order_id.clone(),
                status: WorkStatus::InProgress,
            }),
            Ok(false) => {
                tracing::warn!(order_id = %order_id, "Selected order vanished from order collection")
            }
            Err(e) => tracing::warn!(order_id = %order_id, error = %e, "Failed to mark order in progress"),
        }

        tracing::info!(
            order_id = %order_id,
            generation = self.generation,
            steps = self.script.len(),
            "Inspection started"
        );
        Ok(())
    }

    /// Move to the next step, or identify the part when already on the last one.
    pub fn advance_step(&mut self) -> Result<(), WorkflowError> {
        if self.phase != WorkflowPhase::Procedure {
            tracing::warn!(phase = %self.phase, "advance_step rejected outside procedure");
            return Err(WorkflowError::NotInPhase {
                expected: WorkflowPhase::Procedure,
                actual: self.phase,
            });
        }

        if self.active_step < self.script.last_index() {
            self.active_step += 1;
            tracing::debug!(step = self.active_step, "Procedure step advanced");
            self.outbox.push(WorkflowEvent::StepAdvanced {
                step: self.active_step,
                total: self.script.len(),
            });
            Ok(())
        } else {
            self.trigger_part_identification()
        }
    }

    /// Enter part identification. Repeating it while already there is a no-op.
    pub fn trigger_part_identification(&mut self) -> Result<(), WorkflowError> {
        if self.phase == WorkflowPhase::PartIdentification {
            return Ok(());
        }
        self.ensure_transition(WorkflowPhase::PartIdentification)?;

        let part = self.parts.identify(self.selected_order().as_ref());
        tracing::info!(sku = %part.sku, name = %part.name, "Part identified");
        self.identified_part = Some(part.clone());
        self.set_mic(false);
        self.enter(WorkflowPhase::PartIdentification);
        self.outbox.push(WorkflowEvent::PartIdentified { part });
        Ok(())
    }

    /// Authorize the identified part and move to reporting.
    pub fn complete_job(&mut self) -> Result<(), WorkflowError> {
        self.ensure_transition(WorkflowPhase::Reporting)?;
        self.set_mic(false);
        self.enter(WorkflowPhase::Reporting);
        Ok(())
    }

    /// Return every field to its initial value except permissions.
    pub fn reset_workflow(&mut self) {
        self.generation += 1;
        self.active_step = 0;
        self.set_mic(false);
        self.identified_part = None;
        self.transcript.clear();
        self.selected_order = None;
        if self.phase != WorkflowPhase::Idle {
            self.enter(WorkflowPhase::Idle);
        }
        tracing::info!(generation = self.generation, "Workflow reset");
    }

    /// Flip the logical mic intent. Allowed in every phase.
    pub fn toggle_mic(&mut self) -> bool {
        self.set_mic(!self.is_mic_active);
        self.is_mic_active
    }

    /// Append a finalized fragment, separated by a single space.
    /// Blank fragments are dropped.
    pub fn append_transcript(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.transcript.is_empty() {
            self.transcript.push(' ');
        }
        self.transcript.push_str(fragment);
        self.outbox.push(WorkflowEvent::TranscriptAppended {
            fragment: fragment.to_string(),
        });
    }

    /// Append a fragment recognized during `generation`.
    ///
    /// Returns false, and leaves the transcript alone, if that generation has
    /// since ended.
    pub fn append_transcript_from(&mut self, generation: u64, fragment: &str) -> bool {
        if generation != self.generation {
            tracing::debug!(
                fragment_generation = generation,
                current_generation = self.generation,
                "Dropping stale transcript fragment"
            );
            self.outbox.push(WorkflowEvent::TranscriptFragmentDropped {
                fragment_generation: generation,
            });
            return false;
        }
        self.append_transcript(fragment);
        true
    }

    pub fn clear_transcript(&mut self) {
        if !self.transcript.is_empty() {
            self.transcript.clear();
            self.outbox.push(WorkflowEvent::TranscriptCleared);
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn ensure_transition(&self, target: WorkflowPhase) -> Result<(), WorkflowError> {
        if self.phase.can_transition_to(&target) {
            Ok(())
        } else {
            tracing::warn!(from = %self.phase, to = %target, "Workflow transition rejected");
            Err(WorkflowError::InvalidTransition(self.phase, target))
        }
    }

    fn enter(&mut self, target: WorkflowPhase) {
        let from = self.phase;
        tracing::debug!("Workflow phase: {} -> {}", from, target);
        self.phase = target;
        self.outbox.push(WorkflowEvent::PhaseChanged { from, to: target });
    }

    fn set_mic(&mut self, active: bool) {
        if self.is_mic_active != active {
            self.is_mic_active = active;
            self.outbox.push(WorkflowEvent::MicToggled { active });
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::orders::OrderBook;

    fn setup() -> (WorkflowMachine, Arc<OrderBook>) {
        let orders = Arc::new(OrderBook::with_mock_orders().unwrap());
        let machine = WorkflowMachine::new(ProcedureScript::default(), orders.clone());
        (machine, orders)
    }

    fn started() -> (WorkflowMachine, Arc<OrderBook>) {
        let (mut machine, orders) = setup();
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();
        (machine, orders)
    }

    fn assert_canonical_idle(machine: &WorkflowMachine) {
        assert_eq!(machine.phase(), WorkflowPhase::Idle);
        assert_eq!(machine.active_step(), 0);
        assert!(!machine.is_mic_active());
        assert!(machine.identified_part().is_none());
        assert_eq!(machine.transcript(), "");
        assert!(machine.selected_order_id().is_none());
    }

    #[test]
    fn test_initial_state() {
        let (machine, _) = setup();
        assert_canonical_idle(&machine);
        assert!(!machine.has_permissions());
        assert_eq!(machine.generation(), 0);
    }

    #[test]
    fn test_empty_script_rejected() {
        assert!(matches!(
            ProcedureScript::new(vec![]),
            Err(WorkflowError::EmptyProcedure)
        ));
    }

    #[test]
    fn test_script_from_config() {
        let config = ProcedureConfig {
            steps: vec!["Only step".to_string()],
        };
        let script = ProcedureScript::try_from(&config).unwrap();
        assert_eq!(script.len(), 1);
        assert_eq!(script.last_index(), 0);
        assert_eq!(script.step(0), Some("Only step"));
    }

    #[test]
    fn test_set_permissions_has_no_phase_effect() {
        let (mut machine, _) = setup();
        machine.set_permissions(true);
        assert!(machine.has_permissions());
        assert_eq!(machine.phase(), WorkflowPhase::Idle);
    }

    #[test]
    fn test_select_order_does_not_change_phase() {
        let (mut machine, _) = setup();
        machine.select_order(OrderId::from("WO-1038")).unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::Idle);
        assert_eq!(machine.selected_order().unwrap().customer, "Huckletree Shoreditch");
    }

    #[test]
    fn test_select_unknown_order() {
        let (mut machine, _) = setup();
        let err = machine.select_order(OrderId::from("WO-0000")).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownOrder(_)));
        assert!(machine.selected_order_id().is_none());
    }

    #[test]
    fn test_begin_without_order_is_noop() {
        let (mut machine, _) = setup();
        machine.begin_inspection().unwrap();
        assert_canonical_idle(&machine);
        assert_eq!(machine.generation(), 0);
        assert!(machine.drain_events().is_empty());
    }

    #[test]
    fn test_begin_inspection_scenario() {
        let (machine, orders) = started();
        assert_eq!(machine.phase(), WorkflowPhase::Procedure);
        assert_eq!(machine.active_step(), 0);
        assert!(machine.is_mic_active());
        assert_eq!(machine.transcript(), "");
        assert_eq!(machine.generation(), 1);
        assert_eq!(
            orders.get(&OrderId::from("WO-1042")).unwrap().status,
            WorkStatus::InProgress
        );
    }

    #[test]
    fn test_begin_ignores_permissions() {
        let (mut machine, _) = setup();
        assert!(!machine.has_permissions());
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::Procedure);
    }

    #[test]
    fn test_begin_while_in_procedure_rejected() {
        let (mut machine, _) = started();
        machine.advance_step().unwrap();
        let err = machine.begin_inspection().unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition(WorkflowPhase::Procedure, WorkflowPhase::Procedure)
        ));
        assert_eq!(machine.active_step(), 1);
    }

    #[test]
    fn test_advance_increments_by_one() {
        let (mut machine, _) = started();
        machine.advance_step().unwrap();
        assert_eq!(machine.active_step(), 1);
        machine.advance_step().unwrap();
        assert_eq!(machine.active_step(), 2);
        assert_eq!(machine.phase(), WorkflowPhase::Procedure);
    }

    #[test]
    fn test_advance_through_script_identifies_part() {
        let (mut machine, _) = started();
        let len = machine.script().len();

        for _ in 0..len - 1 {
            machine.advance_step().unwrap();
            assert_eq!(machine.phase(), WorkflowPhase::Procedure);
        }
        assert_eq!(machine.active_step(), len - 1);

        machine.advance_step().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::PartIdentification);
        assert!(!machine.is_mic_active());
        let part = machine.identified_part().unwrap();
        assert_eq!(part.sku, "SKU-992");
    }

    #[test]
    fn test_single_step_script_identifies_on_first_advance() {
        let orders = Arc::new(OrderBook::with_mock_orders().unwrap());
        let script = ProcedureScript::new(vec!["Inspect".to_string()]).unwrap();
        let mut machine = WorkflowMachine::new(script, orders);
        machine.select_order(OrderId::from("WO-1053")).unwrap();
        machine.begin_inspection().unwrap();

        machine.advance_step().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::PartIdentification);
    }

    #[test]
    fn test_advance_outside_procedure_rejected() {
        let (mut machine, _) = setup();
        let err = machine.advance_step().unwrap_err();
        assert!(matches!(err, WorkflowError::NotInPhase { .. }));
        assert_eq!(machine.active_step(), 0);
    }

    #[test]
    fn test_trigger_part_identification_is_idempotent() {
        let (mut machine, _) = started();
        machine.trigger_part_identification().unwrap();
        machine.drain_events();

        machine.trigger_part_identification().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::PartIdentification);
        assert!(machine.drain_events().is_empty());
    }

    #[test]
    fn test_trigger_from_idle_rejected() {
        let (mut machine, _) = setup();
        assert!(machine.trigger_part_identification().is_err());
        assert!(machine.identified_part().is_none());
    }

    #[test]
    fn test_complete_job() {
        let (mut machine, _) = started();
        machine.trigger_part_identification().unwrap();
        machine.toggle_mic();
        assert!(machine.is_mic_active());

        machine.complete_job().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::Reporting);
        assert!(!machine.is_mic_active());
        assert!(machine.identified_part().is_some());
    }

    #[test]
    fn test_complete_job_from_procedure_rejected() {
        let (mut machine, _) = started();
        let err = machine.complete_job().unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition(WorkflowPhase::Procedure, WorkflowPhase::Reporting)
        ));
        assert!(machine.is_mic_active());
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn captured(capture: &LogCapture) -> String {
        String::from_utf8(capture.0.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn test_rejected_transitions_are_logged_at_warn() {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish();

        let (mut machine, _) = started();
        let (complete, trigger_from_idle) = tracing::subscriber::with_default(subscriber, || {
            let complete = machine.complete_job();
            machine.reset_workflow();
            (complete, machine.trigger_part_identification())
        });

        assert!(complete.is_err());
        assert!(trigger_from_idle.is_err());
        assert_eq!(machine.phase(), WorkflowPhase::Idle);

        let logs = captured(&capture);
        let warnings: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains("WARN") && line.contains("Workflow transition rejected"))
            .collect();
        assert_eq!(warnings.len(), 2, "{logs}");
        assert!(warnings[0].contains("to=reporting"), "{logs}");
        assert!(warnings[1].contains("to=part_identification"), "{logs}");
    }

    #[test]
    fn test_reset_from_every_phase_is_canonical_idle() {
        // idle
        let (mut machine, _) = setup();
        machine.reset_workflow();
        assert_canonical_idle(&machine);

        // procedure, with transcript
        let (mut machine, _) = started();
        machine.append_transcript("valve rotated");
        machine.advance_step().unwrap();
        machine.reset_workflow();
        assert_canonical_idle(&machine);

        // part identification
        let (mut machine, _) = started();
        machine.trigger_part_identification().unwrap();
        machine.reset_workflow();
        assert_canonical_idle(&machine);

        // reporting
        let (mut machine, _) = started();
        machine.trigger_part_identification().unwrap();
        machine.complete_job().unwrap();
        machine.reset_workflow();
        assert_canonical_idle(&machine);
    }

    #[test]
    fn test_reset_keeps_permissions_and_is_reusable() {
        let (mut machine, _) = setup();
        machine.set_permissions(true);
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();
        machine.reset_workflow();
        assert!(machine.has_permissions());

        machine.select_order(OrderId::from("WO-1053")).unwrap();
        machine.begin_inspection().unwrap();
        assert_eq!(machine.phase(), WorkflowPhase::Procedure);
        assert_eq!(machine.generation(), 3);
    }

    #[test]
    fn test_toggle_mic_roundtrip() {
        let (mut machine, _) = setup();
        assert!(machine.toggle_mic());
        assert!(!machine.toggle_mic());
        assert!(!machine.is_mic_active());
    }

    #[test]
    fn test_append_transcript_joins_with_single_space() {
        let (mut machine, _) = setup();
        machine.append_transcript("a");
        machine.append_transcript("b");
        assert_eq!(machine.transcript(), "a b");
    }

    #[test]
    fn test_append_blank_fragment_is_dropped() {
        let (mut machine, _) = setup();
        machine.append_transcript("");
        machine.append_transcript("   ");
        assert_eq!(machine.transcript(), "");

        machine.append_transcript("gauge ok");
        machine.append_transcript("  ");
        assert_eq!(machine.transcript(), "gauge ok");
    }

    #[test]
    fn test_clear_transcript() {
        let (mut machine, _) = setup();
        machine.append_transcript("something");
        machine.clear_transcript();
        assert_eq!(machine.transcript(), "");
    }

    #[test]
    fn test_begin_clears_previous_transcript() {
        let (mut machine, _) = setup();
        machine.append_transcript("left over");
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();
        assert_eq!(machine.transcript(), "");
    }

    #[test]
    fn test_stale_fragment_dropped_after_reset() {
        let (mut machine, _) = started();
        let old_generation = machine.generation();
        assert!(machine.append_transcript_from(old_generation, "first"));

        machine.reset_workflow();
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();

        assert!(!machine.append_transcript_from(old_generation, "late"));
        assert_eq!(machine.transcript(), "");
        assert!(machine.append_transcript_from(machine.generation(), "fresh"));
        assert_eq!(machine.transcript(), "fresh");
    }

    #[test]
    fn test_events_for_full_run() {
        let (mut machine, _) = setup();
        machine.select_order(OrderId::from("WO-1042")).unwrap();
        machine.begin_inspection().unwrap();
        let events = machine.drain_events();
        assert!(events.contains(&WorkflowEvent::PhaseChanged {
            from: WorkflowPhase::Idle,
            to: WorkflowPhase::Procedure,
        }));
        assert!(events.contains(&WorkflowEvent::MicToggled { active: true }));
        assert!(events.contains(&WorkflowEvent::OrderStatusChanged {
            order_id: OrderId::from("WO-1042"),
            status: WorkStatus::InProgress,
        }));

        machine.trigger_part_identification().unwrap();
        let events = machine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, WorkflowEvent::PartIdentified { .. })));
        assert!(machine.drain_events().is_empty());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let (mut machine, _) = started();
        machine.advance_step().unwrap();
        machine.append_transcript("pressure nominal");

        let snap = machine.snapshot();
        assert_eq!(snap.phase, WorkflowPhase::Procedure);
        assert_eq!(snap.active_step, 1);
        assert_eq!(snap.step_count, 5);
        assert_eq!(
            snap.current_step.as_deref(),
            Some("Verify pressure gauge reads below 2.5 bar")
        );
        assert_eq!(snap.transcript, "pressure nominal");
        assert_eq!(snap.selected_order, Some(OrderId::from("WO-1042")));
    }
}
