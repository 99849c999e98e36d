//! Dictation adapter with restart-on-drop semantics.
//!
//! While dictation is logically on, every unsolicited `End` from the
//! recognizer triggers exactly one restart attempt. A deliberate stop
//! detaches the end handler first, so it never races an auto-restart.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use alloy_core::config::DictationConfig;

use crate::recognizer::{RecognizerEvent, RecognizerOptions, SpeechRecognizer};

/// Receives each finalized, non-empty utterance together with the tag the
/// listening session was started with.
pub type TranscriptCallback = Box<dyn Fn(u64, String) + Send + Sync>;

struct Shared {
    recognizer: Arc<dyn SpeechRecognizer>,
    options: RecognizerOptions,
    auto_restart: bool,
    supported: bool,
    running: AtomicBool,
    should_listen: AtomicBool,
    end_handler_attached: AtomicBool,
    session: AtomicU64,
    tag: AtomicU64,
    restart_attempts: AtomicU64,
    on_transcript: TranscriptCallback,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("session", &self.session.load(Ordering::SeqCst))
            .field("tag", &self.tag.load(Ordering::SeqCst))
            .finish()
    }
}

impl Shared {
    fn detach_and_stop(&self) {
        self.should_listen.store(false, Ordering::SeqCst);
        self.end_handler_attached.store(false, Ordering::SeqCst);
        if self.running.swap(false, Ordering::SeqCst) {
            self.recognizer.stop();
            tracing::info!(
                session = self.session.load(Ordering::SeqCst),
                "Dictation stopped"
            );
        }
    }
}

/// Continuous dictation on top of a [`SpeechRecognizer`].
pub struct DictationAdapter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DictationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictationAdapter")
            .field("supported", &self.shared.supported)
            .field("running", &self.is_running())
            .field("listening", &self.is_listening())
            .field("restart_attempts", &self.restart_attempts())
            .finish()
    }
}

impl DictationAdapter {
    /// Create an adapter. Platform support is checked once, here.
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: &DictationConfig,
        on_transcript: TranscriptCallback,
    ) -> Self {
        let supported = recognizer.is_supported();
        if !supported {
            tracing::warn!("Speech recognition is not supported on this platform");
        }
        Self {
            shared: Arc::new(Shared {
                recognizer,
                options: RecognizerOptions::from(config),
                auto_restart: config.auto_restart,
                supported,
                running: AtomicBool::new(false),
                should_listen: AtomicBool::new(false),
                end_handler_attached: AtomicBool::new(false),
                session: AtomicU64::new(0),
                tag: AtomicU64::new(0),
                restart_attempts: AtomicU64::new(0),
                on_transcript,
            }),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.shared.supported
    }

    /// Whether the recognizer is believed to be running right now.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Whether dictation is logically on.
    pub fn is_listening(&self) -> bool {
        self.shared.should_listen.load(Ordering::SeqCst)
    }

    /// Total auto-restart attempts since construction.
    pub fn restart_attempts(&self) -> u64 {
        self.shared.restart_attempts.load(Ordering::SeqCst)
    }

    /// Tag carried by fragments of the current session.
    pub fn tag(&self) -> u64 {
        self.shared.tag.load(Ordering::SeqCst)
    }

    /// Start listening. Every fragment recognized in this session is
    /// delivered with `tag`.
    ///
    /// Returns `None` without side effects when the platform is unsupported or
    /// the recognizer is already running. A start failure is swallowed and also
    /// yields `None`.
    pub fn start(&self, tag: u64) -> Option<DictationHandle> {
        let shared = &self.shared;
        if !shared.supported || shared.running.load(Ordering::SeqCst) {
            return None;
        }

        shared.tag.store(tag, Ordering::SeqCst);
        shared.should_listen.store(true, Ordering::SeqCst);
        shared.end_handler_attached.store(true, Ordering::SeqCst);
        let session = shared.session.fetch_add(1, Ordering::SeqCst) + 1;

        match shared.recognizer.start(&shared.options) {
            Ok(()) => {
                shared.running.store(true, Ordering::SeqCst);
                tracing::info!(session, tag, language = %shared.options.language, "Dictation started");
                Some(DictationHandle {
                    shared: Arc::clone(shared),
                    session,
                })
            }
            Err(e) => {
                tracing::debug!(session, error = %e, "Recognizer start failed");
                None
            }
        }
    }

    /// Stop listening. The end handler is detached before the recognizer is
    /// stopped, so the resulting `End` does not restart it.
    pub fn stop(&self) {
        self.shared.detach_and_stop();
    }

    /// Flip dictation on or off. Returns whether dictation is now on.
    pub fn toggle(&self) -> bool {
        if self.is_listening() {
            self.stop();
        } else {
            // Handle not needed: `stop` ends whatever session is current.
            let _ = self.start(self.tag());
        }
        self.is_listening()
    }

    /// Feed one recognizer event through the adapter.
    pub fn handle_event(&self, event: RecognizerEvent) {
        let shared = &self.shared;
        match event {
            RecognizerEvent::Result {
                transcript,
                is_final,
            } => {
                if !is_final {
                    tracing::trace!("Discarding interim result");
                    return;
                }
                if !shared.should_listen.load(Ordering::SeqCst) {
                    tracing::debug!("Discarding result delivered after stop");
                    return;
                }
                let text = transcript.trim();
                if !text.is_empty() {
                    (shared.on_transcript)(shared.tag.load(Ordering::SeqCst), text.to_string());
                }
            }
            RecognizerEvent::End => {
                shared.running.store(false, Ordering::SeqCst);
                if !shared.end_handler_attached.load(Ordering::SeqCst)
                    || !shared.should_listen.load(Ordering::SeqCst)
                    || !shared.auto_restart
                {
                    return;
                }

                shared.restart_attempts.fetch_add(1, Ordering::SeqCst);
                match shared.recognizer.start(&shared.options) {
                    Ok(()) => {
                        shared.running.store(true, Ordering::SeqCst);
                        tracing::debug!(
                            session = shared.session.load(Ordering::SeqCst),
                            "Recognizer ended unexpectedly, restarted"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Recognizer restart failed");
                    }
                }
            }
            RecognizerEvent::Error(reason) => {
                shared.running.store(false, Ordering::SeqCst);
                tracing::debug!(%reason, "Recognizer error");
            }
        }
    }
}

impl Drop for DictationAdapter {
    fn drop(&mut self) {
        self.shared.detach_and_stop();
    }
}

/// Handle to one dictation session returned by [`DictationAdapter::start`].
#[derive(Debug)]
pub struct DictationHandle {
    shared: Arc<Shared>,
    session: u64,
}

impl DictationHandle {
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Detach the end handler and stop the recognizer.
    ///
    /// Does nothing if a newer session has been started since this handle
    /// was issued.
    pub fn cancel(self) {
        if self.shared.session.load(Ordering::SeqCst) != self.session {
            tracing::debug!(session = self.session, "Ignoring cancel for superseded session");
            return;
        }
        self.shared.detach_and_stop();
    }
}

/// Forward recognizer events to the adapter until the sender side closes.
pub fn spawn_event_pump(
    adapter: Arc<DictationAdapter>,
    mut events: mpsc::UnboundedReceiver<RecognizerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            adapter.handle_event(event);
        }
        tracing::debug!("Recognizer event stream closed");
    })
}
