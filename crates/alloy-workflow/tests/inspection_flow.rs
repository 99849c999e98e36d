//! End-to-end inspection flow through the copilot runtime.
//!
//! Each test wires a fresh runtime to a mock recognizer and a mock media
//! transport, then drives it the way the UI would.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use alloy_core::config::{DictationConfig, SessionConfig};
use alloy_core::orders::{OrderBook, OrderProvider};
use alloy_core::types::{OrderId, WorkStatus};
use alloy_dictation::{spawn_event_pump, DictationAdapter, MockRecognizer, RecognizerEvent};
use alloy_session::{Device, DeviceSynchronizer, MediaTransport, MockTransport};
use alloy_workflow::{
    CopilotHandle, CopilotRuntime, ProcedureScript, ViewKind, ViewModel, WorkflowMachine,
    WorkflowOp, WorkflowPhase,
};

// =============================================================================
// Helpers
// =============================================================================

struct Rig {
    handle: CopilotHandle,
    orders: Arc<OrderBook>,
    recognizer: Arc<MockRecognizer>,
    adapter: Arc<DictationAdapter>,
    transport: Arc<MockTransport>,
    recognizer_events: mpsc::UnboundedSender<RecognizerEvent>,
}

fn start_rig() -> Rig {
    let orders = Arc::new(OrderBook::with_mock_orders().unwrap());
    let machine = WorkflowMachine::new(ProcedureScript::default(), orders.clone());
    let (runtime, handle) = CopilotRuntime::new(machine);

    let recognizer = Arc::new(MockRecognizer::new());
    let adapter = Arc::new(DictationAdapter::new(
        recognizer.clone(),
        &DictationConfig::default(),
        handle.transcript_sink(),
    ));
    let (recognizer_events, events_rx) = mpsc::unbounded_channel();
    spawn_event_pump(adapter.clone(), events_rx);

    let transport = Arc::new(MockTransport::new());
    let devices = Arc::new(DeviceSynchronizer::new(transport.clone()));

    tokio::spawn(
        runtime
            .with_dictation(adapter.clone())
            .with_devices(devices, SessionConfig::default())
            .run(),
    );

    Rig {
        handle,
        orders,
        recognizer,
        adapter,
        transport,
        recognizer_events,
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

fn final_result(text: &str) -> RecognizerEvent {
    RecognizerEvent::Result {
        transcript: text.to_string(),
        is_final: true,
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_begin_inspection_on_new_order() {
    let rig = start_rig();
    let id = OrderId::from("WO-1042");
    assert_eq!(rig.orders.get(&id).unwrap().status, WorkStatus::New);

    rig.handle.set_permissions(true).await.unwrap();
    rig.handle.select_order(id.clone()).await.unwrap();
    let snap = rig.handle.begin_inspection().await.unwrap();

    assert_eq!(snap.phase, WorkflowPhase::Procedure);
    assert_eq!(snap.active_step, 0);
    assert!(snap.is_mic_active);
    assert_eq!(rig.orders.get(&id).unwrap().status, WorkStatus::InProgress);
    assert!(rig.adapter.is_listening());
    assert!(rig.recognizer.is_running());

    wait_for(|| {
        rig.transport.is_enabled(Device::Microphone) && rig.transport.is_enabled(Device::Camera)
    })
    .await;

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_full_procedure_reaches_part_identification() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    let mut snap = rig.handle.begin_inspection().await.unwrap();

    while snap.phase == WorkflowPhase::Procedure {
        snap = rig.handle.advance_step().await.unwrap();
    }

    assert_eq!(snap.phase, WorkflowPhase::PartIdentification);
    assert!(!snap.is_mic_active);
    assert_eq!(snap.identified_part.as_ref().unwrap().sku, "SKU-992");
    assert!(!rig.adapter.is_listening());

    let vm = ViewModel::from_snapshot(&snap);
    assert_eq!(vm.view, ViewKind::PartIdentification);
    assert!(vm.part_overlay.is_some());

    let snap = rig.handle.complete_job().await.unwrap();
    assert_eq!(snap.phase, WorkflowPhase::Reporting);
    assert_eq!(ViewModel::from_snapshot(&snap).view, ViewKind::Reporting);

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_toggle_mic_twice_restores_state() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1038")).await.unwrap();
    let before = rig.handle.begin_inspection().await.unwrap();

    rig.handle.toggle_mic().await.unwrap();
    assert!(!rig.adapter.is_listening());
    let after = rig.handle.toggle_mic().await.unwrap();

    assert_eq!(after.is_mic_active, before.is_mic_active);
    assert!(rig.adapter.is_listening());

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reset_returns_to_canonical_idle() {
    let rig = start_rig();
    rig.handle.set_permissions(true).await.unwrap();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    rig.handle.begin_inspection().await.unwrap();
    rig.handle.append_transcript("valve rotated").await.unwrap();
    rig.handle.advance_step().await.unwrap();

    let snap = rig.handle.reset_workflow().await.unwrap();
    assert_eq!(snap.phase, WorkflowPhase::Idle);
    assert_eq!(snap.active_step, 0);
    assert!(!snap.is_mic_active);
    assert!(snap.identified_part.is_none());
    assert_eq!(snap.transcript, "");
    assert!(snap.selected_order.is_none());
    assert!(snap.has_permissions);
    assert!(!rig.adapter.is_listening());

    wait_for(|| {
        !rig.transport.is_enabled(Device::Microphone) && !rig.transport.is_enabled(Device::Camera)
    })
    .await;

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dictated_fragments_join_and_blanks_drop() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    rig.handle.begin_inspection().await.unwrap();

    rig.recognizer_events.send(final_result("a")).unwrap();
    rig.recognizer_events.send(final_result("   ")).unwrap();
    rig.recognizer_events
        .send(RecognizerEvent::Result {
            transcript: "interim".to_string(),
            is_final: false,
        })
        .unwrap();
    rig.recognizer_events.send(final_result("b")).unwrap();

    let handle = rig.handle.clone();
    let mut watch = handle.watch();
    tokio::time::timeout(
        Duration::from_secs(1),
        watch.wait_for(|snap| snap.transcript == "a b"),
    )
    .await
    .unwrap()
    .unwrap();

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_begin_without_order_is_noop() {
    let rig = start_rig();
    let snap = rig.handle.begin_inspection().await.unwrap();

    assert_eq!(snap.phase, WorkflowPhase::Idle);
    assert!(!snap.is_mic_active);
    assert_eq!(snap.generation, 0);
    assert_eq!(rig.recognizer.start_calls(), 0);

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_fragment_from_previous_session_is_dropped() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    let first = rig.handle.begin_inspection().await.unwrap();

    rig.handle.reset_workflow().await.unwrap();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    let second = rig.handle.begin_inspection().await.unwrap();
    assert!(second.generation > first.generation);

    // Recognized during the first session, delivered during the second.
    let snap = rig
        .handle
        .dispatch(WorkflowOp::AppendTranscript {
            generation: Some(first.generation),
            text: "late fragment".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(snap.transcript, "");

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_recognizer_end_restarts_exactly_once() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    rig.handle.begin_inspection().await.unwrap();
    assert_eq!(rig.recognizer.start_calls(), 1);

    rig.recognizer_events
        .send(rig.recognizer.end_spontaneously())
        .unwrap();
    wait_for(|| rig.adapter.restart_attempts() == 1).await;

    assert_eq!(rig.recognizer.start_calls(), 2);
    assert!(rig.recognizer.is_running());
    assert!(rig.handle.current().is_mic_active);

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stop_does_not_trigger_restart() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    rig.handle.begin_inspection().await.unwrap();

    rig.handle.toggle_mic().await.unwrap();
    // A recognizer typically reports End after being stopped.
    rig.recognizer_events.send(RecognizerEvent::End).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(rig.adapter.restart_attempts(), 0);
    assert!(!rig.recognizer.is_running());

    rig.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_late_result_after_reset_is_dropped() {
    let rig = start_rig();
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    rig.handle.begin_inspection().await.unwrap();

    let mut watch = rig.handle.watch();
    rig.recognizer_events.send(final_result("valve rotated")).unwrap();
    tokio::time::timeout(
        Duration::from_secs(1),
        watch.wait_for(|snap| snap.transcript == "valve rotated"),
    )
    .await
    .unwrap()
    .unwrap();

    rig.handle.reset_workflow().await.unwrap();
    // The platform flushes a result it recognized before being stopped.
    rig.recognizer_events.send(final_result("stale words")).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snap = rig.handle.snapshot().await.unwrap();
    assert_eq!(snap.phase, WorkflowPhase::Idle);
    assert_eq!(snap.transcript, "");

    // The next inspection starts clean and still hears new dictation.
    rig.handle.select_order(OrderId::from("WO-1042")).await.unwrap();
    let second = rig.handle.begin_inspection().await.unwrap();
    assert_eq!(rig.adapter.tag(), second.generation);
    rig.recognizer_events.send(final_result("gauge reads two bar")).unwrap();
    tokio::time::timeout(
        Duration::from_secs(1),
        watch.wait_for(|snap| snap.transcript == "gauge reads two bar"),
    )
    .await
    .unwrap()
    .unwrap();

    rig.handle.shutdown().await.unwrap();
}
