//! Platform speech recognizer contract and a mock implementation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use alloy_core::config::DictationConfig;
use alloy_core::error::AlloyError;

/// Event delivered by a running recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    /// A recognized utterance. Interim results have `is_final == false`.
    Result { transcript: String, is_final: bool },
    /// The recognizer stopped, whether asked to or not.
    End,
    /// The recognizer reported an error. Usually followed by `End`.
    Error(String),
}

/// Options applied every time the recognizer is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self::from(&DictationConfig::default())
    }
}

impl From<&DictationConfig> for RecognizerOptions {
    fn from(config: &DictationConfig) -> Self {
        Self {
            language: config.language.clone(),
            continuous: config.continuous,
            interim_results: config.interim_results,
        }
    }
}

/// Platform speech-to-text capability.
///
/// Implementations push [`RecognizerEvent`]s to whoever owns the adapter
/// (see [`crate::spawn_event_pump`]); `start` and `stop` only request the
/// change and must not block on it.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether speech recognition is available on this platform.
    fn is_supported(&self) -> bool;

    /// Begin a recognition session.
    fn start(&self, options: &RecognizerOptions) -> Result<(), AlloyError>;

    /// End the current recognition session. Must be safe to call when idle.
    fn stop(&self);
}

/// Mock recognizer for tests and the demo binary.
///
/// Records how often it was started and stopped, and can be told to reject
/// the next start the way a browser recognizer does when it is still busy.
#[derive(Debug)]
pub struct MockRecognizer {
    supported: bool,
    running: AtomicBool,
    fail_next_start: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::with_support(true)
    }

    /// A recognizer that reports the platform as unsupported.
    pub fn unsupported() -> Self {
        Self::with_support(false)
    }

    fn with_support(supported: bool) -> Self {
        Self {
            supported,
            running: AtomicBool::new(false),
            fail_next_start: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// Make the next `start` call fail.
    pub fn fail_next_start(&self) {
        self.fail_next_start.store(true, Ordering::SeqCst);
    }

    /// Simulate the platform ending the session on its own.
    pub fn end_spontaneously(&self) -> RecognizerEvent {
        self.running.store(false, Ordering::SeqCst);
        RecognizerEvent::End
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&self, _options: &RecognizerOptions) -> Result<(), AlloyError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_start.swap(false, Ordering::SeqCst) {
            return Err(AlloyError::Dictation(
                "Recognizer refused to start".to_string(),
            ));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AlloyError::Dictation(
                "Recognizer has already started".to_string(),
            ));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }
}
