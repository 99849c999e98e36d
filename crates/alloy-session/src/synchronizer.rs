//! One-way reconciliation of logical device intent onto the transport.
//!
//! At most one request per device is in flight. Intent that changes while a
//! request is pending is not queued: once the pending request resolves, the
//! latest intent is compared with the transport state and at most one more
//! request is issued. Failures are logged and counted, never retried for the
//! same intent, and never roll back workflow state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use alloy_core::config::SessionConfig;

use crate::{Device, MediaTransport};

/// Desired state of both input devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIntent {
    pub microphone: bool,
    pub camera: bool,
}

#[derive(Debug, Default)]
struct DeviceSlot {
    desired: Option<bool>,
    pending: bool,
    failures: u64,
}

/// Keeps a [`MediaTransport`] in line with the latest [`DeviceIntent`].
pub struct DeviceSynchronizer {
    transport: Arc<dyn MediaTransport>,
    slots: Mutex<HashMap<Device, DeviceSlot>>,
}

impl std::fmt::Debug for DeviceSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSynchronizer")
            .field("slots", &*self.slots())
            .finish()
    }
}

impl DeviceSynchronizer {
    pub fn new(transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            transport,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Device, DeviceSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the desired state of a device without contacting the transport.
    pub fn set_intent(&self, device: Device, enabled: bool) {
        self.slots().entry(device).or_default().desired = Some(enabled);
    }

    /// Latest recorded intent for a device.
    pub fn intent(&self, device: Device) -> Option<bool> {
        self.slots().get(&device).and_then(|s| s.desired)
    }

    /// Whether a request for this device is in flight.
    pub fn is_pending(&self, device: Device) -> bool {
        self.slots().get(&device).is_some_and(|s| s.pending)
    }

    /// Failed requests for this device since construction.
    pub fn failures(&self, device: Device) -> u64 {
        self.slots().get(&device).map_or(0, |s| s.failures)
    }

    /// Bring one device in line with its recorded intent.
    ///
    /// Returns immediately if a request for the device is already pending;
    /// that request's owner picks up the new intent when it resolves.
    pub async fn reconcile(&self, device: Device) {
        loop {
            let desired = {
                let mut slots = self.slots();
                let slot = slots.entry(device).or_default();
                if slot.pending {
                    tracing::trace!(%device, "Toggle already pending, deferring");
                    return;
                }
                let Some(desired) = slot.desired else {
                    return;
                };
                if self.transport.is_enabled(device) == desired {
                    return;
                }
                slot.pending = true;
                desired
            };

            tracing::debug!(%device, enabled = desired, "Requesting device toggle");
            let result = self.transport.set_enabled(device, desired).await;

            let mut slots = self.slots();
            let slot = slots.entry(device).or_default();
            slot.pending = false;
            if let Err(e) = result {
                slot.failures += 1;
                tracing::warn!(%device, enabled = desired, error = %e, "Device toggle failed");
                if slot.desired == Some(desired) {
                    return;
                }
            }
        }
    }

    /// Reconcile both devices concurrently.
    pub async fn reconcile_all(&self) {
        tokio::join!(
            self.reconcile(Device::Microphone),
            self.reconcile(Device::Camera)
        );
    }

    /// Record the intents `config` lets the workflow drive, then reconcile
    /// both devices in the background.
    ///
    /// The intent is updated before this returns, so a later call always
    /// supersedes an earlier one even if the earlier reconcile is still running.
    /// A device the config leaves alone keeps whatever intent it had.
    pub fn apply_detached(
        self: &Arc<Self>,
        intent: DeviceIntent,
        config: &SessionConfig,
    ) -> JoinHandle<()> {
        if config.sync_microphone {
            self.set_intent(Device::Microphone, intent.microphone);
        }
        if config.camera_follows_workflow {
            self.set_intent(Device::Camera, intent.camera);
        }
        let this = Arc::clone(self);
        tokio::spawn(async move { this.reconcile_all().await })
    }
}
