//! AlloyPro Dictation crate - continuous speech-to-text capture on top of a
//! platform recognizer.
//!
//! The recognizer is an external capability behind [`SpeechRecognizer`]. The
//! [`DictationAdapter`] turns its event stream into finalized transcript
//! fragments and keeps it running while dictation is logically on, restarting
//! it whenever it ends on its own.

pub mod adapter;
pub mod recognizer;

pub use adapter::{spawn_event_pump, DictationAdapter, DictationHandle, TranscriptCallback};
pub use recognizer::{MockRecognizer, RecognizerEvent, RecognizerOptions, SpeechRecognizer};
