//! AlloyPro Session crate - keeps the real-time transport's camera and
//! microphone in step with what the workflow wants.
//!
//! The transport itself (signaling, media tracks) is external and sits behind
//! the [`MediaTransport`] trait. A mock implementation is provided for tests
//! and the demo binary.

pub mod synchronizer;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use alloy_core::error::AlloyError;

pub use synchronizer::{DeviceIntent, DeviceSynchronizer};

// =============================================================================
// Enums
// =============================================================================

/// Input device published into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Microphone,
    Camera,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Microphone => write!(f, "microphone"),
            Device::Camera => write!(f, "camera"),
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Real-time audio/video transport.
///
/// Enabling or disabling a device is asynchronous and may fail; the
/// synchronizer never has more than one request in flight per device.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Request that a device be enabled or disabled.
    async fn set_enabled(&self, device: Device, enabled: bool) -> Result<(), AlloyError>;

    /// Current enabled state of a device as reported by the transport.
    fn is_enabled(&self, device: Device) -> bool;

    async fn toggle_microphone(&self, enabled: bool) -> Result<(), AlloyError> {
        self.set_enabled(Device::Microphone, enabled).await
    }

    async fn toggle_camera(&self, enabled: bool) -> Result<(), AlloyError> {
        self.set_enabled(Device::Camera, enabled).await
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock transport for testing.
///
/// Records every request, can hold the next request open until
/// [`MockTransport::release`] is called, and can fail the next request.
#[derive(Debug, Default)]
pub struct MockTransport {
    microphone: AtomicBool,
    camera: AtomicBool,
    hold_next: AtomicBool,
    fail_next: AtomicBool,
    gate: Notify,
    calls: Mutex<Vec<(Device, bool)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the next request pending until `release` is called.
    pub fn hold_next(&self) {
        self.hold_next.store(true, Ordering::SeqCst);
    }

    /// Let a held request complete.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Make the next request fail without changing device state.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<(Device, bool)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn flag(&self, device: Device) -> &AtomicBool {
        match device {
            Device::Microphone => &self.microphone,
            Device::Camera => &self.camera,
        }
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn set_enabled(&self, device: Device, enabled: bool) -> Result<(), AlloyError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((device, enabled));

        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AlloyError::Session(format!(
                "Could not {} {}",
                if enabled { "enable" } else { "disable" },
                device
            )));
        }

        self.flag(device).store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_enabled(&self, device: Device) -> bool {
        self.flag(device).load(Ordering::SeqCst)
    }
}
