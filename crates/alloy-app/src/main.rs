//! AlloyPro application binary - composition root.
//!
//! 1. Parse the command line and load configuration from TOML
//! 2. Initialize tracing
//! 3. Load the service order book
//! 4. Run the requested subcommand
//!
//! `inspect` wires the full copilot: workflow runtime, dictation adapter on a
//! mock recognizer, and device synchronizer on a mock transport. Utterances
//! passed with `--say` are fed through the recognizer as finalized results.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use alloy_core::config::AlloyConfig;
use alloy_core::orders::{OrderBook, OrderProvider};
use alloy_core::types::{NewServiceOrder, OrderId, ServiceOrder, WorkStatus};
use alloy_dictation::{spawn_event_pump, DictationAdapter, MockRecognizer, RecognizerEvent};
use alloy_procurement::{backend_from_config, place_purchase_order, PurchaseRequest};
use alloy_session::{DeviceSynchronizer, MockTransport};
use alloy_workflow::{
    CopilotHandle, CopilotRuntime, ProcedureScript, ViewKind, ViewModel, WorkflowMachine,
    WorkflowPhase, WorkflowSnapshot,
};

use cli::{CliArgs, Command};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// How long to wait for a dictated utterance to land in the transcript.
const DICTATION_SETTLE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    // Config is loaded before tracing so its log level can seed the filter.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let config = AlloyConfig::load_or_default(&config_file);

    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting AlloyPro v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::debug!(path = %config_file.display(), "No configuration file, using defaults");
    }

    let orders = Arc::new(OrderBook::with_mock_orders()?);
    tracing::debug!(count = orders.list()?.len(), "Order book ready");

    let order_id = args.command.order_id();
    match args.command {
        Command::Orders { status } => list_orders(&orders, status)?,
        Command::New { from } => {
            let intake = std::fs::read_to_string(&from)
                .map_err(|e| format!("Cannot read intake file {}: {e}", from.display()))?;
            let order = open_order(&orders, &intake)?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
        Command::Show { .. } => {
            let order = find_order(&orders, order_id)?;
            println!("{}", serde_json::to_string_pretty(&order)?);
        }
        Command::Inspect {
            say,
            deny_permissions,
            ..
        } => {
            let order = find_order(&orders, order_id)?;
            run_inspection(&config, orders, order.id, say, !deny_permissions).await?;
        }
        Command::Purchase { sku, .. } => {
            let order = find_order(&orders, order_id)?;
            purchase(&config, &order, &sku).await?;
        }
    }

    Ok(())
}

fn find_order(orders: &OrderBook, id: Option<OrderId>) -> AppResult<ServiceOrder> {
    let id = id.ok_or("No order id given")?;
    orders
        .get(&id)
        .ok_or_else(|| format!("Service order not found: {id}").into())
}

/// Number an intake submission and add it to the book.
fn open_order(orders: &OrderBook, intake: &str) -> AppResult<ServiceOrder> {
    let submission: NewServiceOrder = serde_json::from_str(intake)?;
    let id = orders.add_order(submission)?;
    find_order(orders, Some(id))
}

fn list_orders(orders: &OrderBook, status: Option<WorkStatus>) -> AppResult<()> {
    let list = match status {
        Some(status) => orders.filter_by_status(status)?,
        None => orders.list()?,
    };
    for order in &list {
        println!(
            "{:<8} {:<16} {:<24} {:<10} {}",
            order.id,
            order.status.label(),
            order.customer,
            order.system,
            order.description
        );
    }
    if list.is_empty() {
        println!("No service orders.");
    }
    Ok(())
}

// =============================================================================
// inspect
// =============================================================================

async fn run_inspection(
    config: &AlloyConfig,
    orders: Arc<OrderBook>,
    order_id: OrderId,
    utterances: Vec<String>,
    permissions_granted: bool,
) -> AppResult<()> {
    let script = ProcedureScript::try_from(&config.procedure)?;
    let machine = WorkflowMachine::new(script, orders.clone());
    let (runtime, handle) = CopilotRuntime::new(machine);

    let recognizer = Arc::new(MockRecognizer::new());
    let adapter = Arc::new(DictationAdapter::new(
        recognizer,
        &config.dictation,
        handle.transcript_sink(),
    ));
    let (recognizer_tx, recognizer_rx) = mpsc::unbounded_channel();
    let pump = spawn_event_pump(Arc::clone(&adapter), recognizer_rx);

    let devices = Arc::new(DeviceSynchronizer::new(Arc::new(MockTransport::new())));

    let runtime_task = tokio::spawn(
        runtime
            .with_dictation(Arc::clone(&adapter))
            .with_devices(devices, config.session.clone())
            .run(),
    );

    let result = drive_inspection(&handle, &recognizer_tx, order_id, utterances, permissions_granted).await;

    handle.shutdown().await?;
    drop(recognizer_tx);
    let _ = runtime_task.await;
    let _ = pump.await;

    result
}

async fn drive_inspection(
    handle: &CopilotHandle,
    recognizer: &mpsc::UnboundedSender<RecognizerEvent>,
    order_id: OrderId,
    utterances: Vec<String>,
    permissions_granted: bool,
) -> AppResult<()> {
    let snapshot = handle.set_permissions(permissions_granted).await?;
    if !snapshot.has_permissions {
        return Err("Camera and microphone access is required to start an inspection".into());
    }

    handle.select_order(order_id).await?;
    let mut snapshot = handle.begin_inspection().await?;
    render(&snapshot);

    let mut utterances = utterances.into_iter();
    while snapshot.phase == WorkflowPhase::Procedure {
        let last_step = snapshot.active_step + 1 == snapshot.step_count;
        let batch: Vec<String> = if last_step {
            utterances.by_ref().collect()
        } else {
            utterances.next().into_iter().collect()
        };
        for utterance in batch {
            dictate(handle, recognizer, &utterance).await?;
        }

        snapshot = handle.advance_step().await?;
        render(&snapshot);
    }

    let snapshot = handle.complete_job().await?;
    render(&snapshot);

    let snapshot = handle.reset_workflow().await?;
    render(&snapshot);
    Ok(())
}

/// Feed one utterance through the recognizer and wait until the runtime has
/// appended it.
async fn dictate(
    handle: &CopilotHandle,
    recognizer: &mpsc::UnboundedSender<RecognizerEvent>,
    utterance: &str,
) -> AppResult<()> {
    let expected = utterance.trim().to_string();
    recognizer.send(RecognizerEvent::Result {
        transcript: utterance.to_string(),
        is_final: true,
    })?;
    if expected.is_empty() {
        return Ok(());
    }

    let mut snapshots = handle.watch();
    let landed = tokio::time::timeout(
        DICTATION_SETTLE,
        snapshots.wait_for(|s| s.transcript.ends_with(&expected)),
    )
    .await;
    match landed {
        Ok(Ok(_)) => {}
        Ok(Err(_)) => return Err("Copilot runtime stopped while dictating".into()),
        Err(_) => tracing::warn!(utterance = %expected, "Dictated utterance did not reach the transcript"),
    }
    Ok(())
}

fn render(snapshot: &WorkflowSnapshot) {
    let vm = ViewModel::from_snapshot(snapshot);
    println!();
    match vm.view {
        ViewKind::Idle => println!("== Dashboard =="),
        ViewKind::Procedure => println!("== Procedure =="),
        ViewKind::PartIdentification => println!("== Part identified =="),
        ViewKind::Reporting => println!("== Report =="),
    }
    if let (Some(label), Some(step)) = (&vm.step_label, &vm.current_step) {
        println!("{label}: {step}");
    }
    if let Some(part) = &vm.part_overlay {
        println!(
            "{} [{}]  lead time {}  cost {}  stock {}",
            part.name, part.sku, part.lead_time, part.cost, part.stock
        );
    }
    if vm.show_voice_controls {
        println!("mic: {}", vm.mic_indicator);
        if !vm.transcript.is_empty() {
            println!("transcript: {}", vm.transcript);
        }
    }
}

// =============================================================================
// purchase
// =============================================================================

async fn purchase(config: &AlloyConfig, order: &ServiceOrder, sku: &str) -> AppResult<()> {
    let request = PurchaseRequest::for_sku(order, sku)?;
    let backend = backend_from_config(&config.procurement)?;
    let outcome = place_purchase_order(backend.as_ref(), &request).await;
    if let Some(warning) = &outcome.warning {
        tracing::warn!(%warning, "Purchase completed with a warning");
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
