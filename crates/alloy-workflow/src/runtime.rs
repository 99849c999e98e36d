//! Serialized dispatch around a [`WorkflowMachine`].
//!
//! UI actions, transcript callbacks and the CLI all go through a
//! [`CopilotHandle`], which queues commands on a single channel. The
//! [`CopilotRuntime`] task owns the machine and applies one command at a
//! time. After each command it:
//!
//! 1. publishes the new [`WorkflowSnapshot`] on a watch channel
//! 2. broadcasts the machine's events as [`EventRecord`]s
//! 3. starts or stops dictation to match the mic intent
//! 4. hands changed device intent to the [`DeviceSynchronizer`]
//!
//! Device reconciliation runs in spawned tasks, so a slow transport never
//! holds up dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use alloy_core::config::SessionConfig;
use alloy_core::types::OrderId;
use alloy_dictation::{DictationAdapter, DictationHandle, TranscriptCallback};
use alloy_session::{DeviceIntent, DeviceSynchronizer};

use crate::error::WorkflowError;
use crate::events::EventRecord;
use crate::machine::{WorkflowMachine, WorkflowSnapshot};
use crate::phase::WorkflowPhase;

const EVENT_CAPACITY: usize = 256;

type Reply = Result<WorkflowSnapshot, WorkflowError>;

/// One workflow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOp {
    SetPermissions(bool),
    SelectOrder(OrderId),
    BeginInspection,
    AdvanceStep,
    TriggerPartIdentification,
    CompleteJob,
    ResetWorkflow,
    ToggleMic,
    /// `generation` is `None` for text that is not tied to a dictation session.
    AppendTranscript {
        generation: Option<u64>,
        text: String,
    },
    ClearTranscript,
    Snapshot,
    Shutdown,
}

#[derive(Debug)]
struct Command {
    op: WorkflowOp,
    respond: Option<oneshot::Sender<Reply>>,
}

/// Owns the workflow machine and its collaborators.
pub struct CopilotRuntime {
    machine: WorkflowMachine,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot_tx: watch::Sender<WorkflowSnapshot>,
    event_tx: broadcast::Sender<EventRecord>,
    generation: Arc<AtomicU64>,
    dictation: Option<Arc<DictationAdapter>>,
    dictation_handle: Option<DictationHandle>,
    devices: Option<(Arc<DeviceSynchronizer>, SessionConfig)>,
    last_intent: Option<DeviceIntent>,
}

impl std::fmt::Debug for CopilotRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopilotRuntime")
            .field("machine", &self.machine)
            .field("dictation", &self.dictation.is_some())
            .field("devices", &self.devices.is_some())
            .finish()
    }
}

impl CopilotRuntime {
    pub fn new(machine: WorkflowMachine) -> (Self, CopilotHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let generation = Arc::new(AtomicU64::new(machine.generation()));

        let handle = CopilotHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx.clone(),
            generation: Arc::clone(&generation),
        };
        let runtime = Self {
            machine,
            commands,
            snapshot_tx,
            event_tx,
            generation,
            dictation: None,
            dictation_handle: None,
            devices: None,
            last_intent: None,
        };
        (runtime, handle)
    }

    /// Drive this dictation adapter from the mic intent.
    ///
    /// The adapter's transcript callback should come from
    /// [`CopilotHandle::transcript_sink`].
    pub fn with_dictation(mut self, adapter: Arc<DictationAdapter>) -> Self {
        self.dictation = Some(adapter);
        self
    }

    /// Mirror mic and camera intent onto a media transport.
    pub fn with_devices(mut self, devices: Arc<DeviceSynchronizer>, config: SessionConfig) -> Self {
        self.devices = Some((devices, config));
        self
    }

    /// Process commands until `Shutdown` is received or every handle is gone.
    pub async fn run(mut self) {
        tracing::debug!("Copilot runtime started");

        while let Some(Command { op, respond }) = self.commands.recv().await {
            if op == WorkflowOp::Shutdown {
                if let Some(respond) = respond {
                    let _ = respond.send(Ok(self.machine.snapshot()));
                }
                break;
            }

            let result = self.apply(op);
            self.publish();

            if let Some(respond) = respond {
                let _ = respond.send(result.map(|()| self.machine.snapshot()));
            } else if let Err(e) = result {
                tracing::debug!(error = %e, "Fire-and-forget workflow command rejected");
            }
        }

        if let Some(handle) = self.dictation_handle.take() {
            handle.cancel();
        }
        if let Some(adapter) = &self.dictation {
            adapter.stop();
        }
        tracing::debug!("Copilot runtime stopped");
    }

    fn apply(&mut self, op: WorkflowOp) -> Result<(), WorkflowError> {
        let machine = &mut self.machine;
        match op {
            WorkflowOp::SetPermissions(granted) => machine.set_permissions(granted),
            WorkflowOp::SelectOrder(id) => machine.select_order(id)?,
            WorkflowOp::BeginInspection => machine.begin_inspection()?,
            WorkflowOp::AdvanceStep => machine.advance_step()?,
            WorkflowOp::TriggerPartIdentification => machine.trigger_part_identification()?,
            WorkflowOp::CompleteJob => machine.complete_job()?,
            WorkflowOp::ResetWorkflow => machine.reset_workflow(),
            WorkflowOp::ToggleMic => {
                machine.toggle_mic();
            }
            WorkflowOp::AppendTranscript { generation, text } => match generation {
                Some(generation) => {
                    machine.append_transcript_from(generation, &text);
                }
                None => machine.append_transcript(&text),
            },
            WorkflowOp::ClearTranscript => machine.clear_transcript(),
            WorkflowOp::Snapshot | WorkflowOp::Shutdown => {}
        }
        Ok(())
    }

    fn publish(&mut self) {
        let generation = self.machine.generation();
        self.generation.store(generation, Ordering::SeqCst);

        for event in self.machine.drain_events() {
            tracing::debug!(generation, ?event, "Workflow event");
            // No subscribers is fine.
            let _ = self.event_tx.send(EventRecord::new(generation, event));
        }

        let snapshot = self.machine.snapshot();
        self.sync_dictation(snapshot.is_mic_active, generation);
        self.sync_devices(&snapshot);
        self.snapshot_tx.send_replace(snapshot);
    }

    fn sync_dictation(&mut self, mic_active: bool, generation: u64) {
        let Some(adapter) = &self.dictation else {
            return;
        };

        // A session started for an earlier generation would stamp its
        // fragments stale; restart it under the current one.
        if mic_active && adapter.is_listening() && adapter.tag() != generation {
            tracing::debug!(from = adapter.tag(), to = generation, "Restarting dictation for new generation");
            match self.dictation_handle.take() {
                Some(handle) => handle.cancel(),
                None => adapter.stop(),
            }
        }

        if mic_active && !adapter.is_listening() {
            self.dictation_handle = adapter.start(generation);
            if self.dictation_handle.is_none() {
                tracing::debug!(
                    supported = adapter.is_supported(),
                    "Dictation not started for active mic"
                );
            }
        } else if !mic_active && adapter.is_listening() {
            match self.dictation_handle.take() {
                Some(handle) => handle.cancel(),
                None => adapter.stop(),
            }
        }
    }

    fn sync_devices(&mut self, snapshot: &WorkflowSnapshot) {
        let Some((devices, config)) = &self.devices else {
            return;
        };

        let intent = DeviceIntent {
            microphone: snapshot.is_mic_active,
            camera: snapshot.phase != WorkflowPhase::Idle,
        };
        if self.last_intent == Some(intent) {
            return;
        }
        self.last_intent = Some(intent);

        // Reconcile is detached; completion is observed on the transport.
        let _ = devices.apply_detached(intent, config);
    }
}

/// Cloneable front door to a running [`CopilotRuntime`].
#[derive(Debug, Clone)]
pub struct CopilotHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<WorkflowSnapshot>,
    events: broadcast::Sender<EventRecord>,
    generation: Arc<AtomicU64>,
}

impl CopilotHandle {
    /// Queue an operation and wait for the resulting snapshot.
    pub async fn dispatch(&self, op: WorkflowOp) -> Result<WorkflowSnapshot, WorkflowError> {
        let (respond, response) = oneshot::channel();
        self.commands
            .send(Command {
                op,
                respond: Some(respond),
            })
            .map_err(|_| WorkflowError::RuntimeClosed)?;
        response.await.map_err(|_| WorkflowError::RuntimeClosed)?
    }

    pub async fn set_permissions(&self, granted: bool) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::SetPermissions(granted)).await
    }

    pub async fn select_order(&self, id: OrderId) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::SelectOrder(id)).await
    }

    pub async fn begin_inspection(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::BeginInspection).await
    }

    pub async fn advance_step(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::AdvanceStep).await
    }

    pub async fn trigger_part_identification(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::TriggerPartIdentification).await
    }

    pub async fn complete_job(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::CompleteJob).await
    }

    pub async fn reset_workflow(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::ResetWorkflow).await
    }

    pub async fn toggle_mic(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::ToggleMic).await
    }

    /// Append text typed or pasted outside a dictation session.
    pub async fn append_transcript(
        &self,
        text: impl Into<String>,
    ) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::AppendTranscript {
            generation: None,
            text: text.into(),
        })
        .await
    }

    pub async fn clear_transcript(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::ClearTranscript).await
    }

    /// State after every command queued before this call has been applied.
    pub async fn snapshot(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.dispatch(WorkflowOp::Snapshot).await
    }

    /// Stop the runtime. Dictation is stopped on the way out.
    ///
    /// The transcript sink keeps the command channel open, so the runtime
    /// only exits on its own once the dictation adapter is dropped too.
    pub async fn shutdown(&self) -> Result<(), WorkflowError> {
        self.dispatch(WorkflowOp::Shutdown).await.map(|_| ())
    }

    /// Latest published snapshot, without queueing anything.
    pub fn current(&self) -> WorkflowSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Callback for [`DictationAdapter::new`].
    ///
    /// Each fragment carries the generation its dictation session was
    /// started under, so fragments that arrive after a reset or a new
    /// inspection are dropped instead of appended.
    pub fn transcript_sink(&self) -> TranscriptCallback {
        let commands = self.commands.clone();
        Box::new(move |generation: u64, text: String| {
            let op = WorkflowOp::AppendTranscript {
                generation: Some(generation),
                text,
            };
            if commands.send(Command { op, respond: None }).is_err() {
                tracing::debug!("Transcript fragment arrived after runtime shutdown");
            }
        })
    }
}
