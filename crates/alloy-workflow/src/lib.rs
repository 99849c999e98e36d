//! AlloyPro Workflow crate - the inspection state machine, its dispatch
//! runtime, and the view derived from it.

pub mod error;
pub mod events;
pub mod machine;
pub mod parts;
pub mod phase;
pub mod runtime;
pub mod view;

pub use error::WorkflowError;
pub use events::{EventRecord, WorkflowEvent};
pub use machine::{ProcedureScript, WorkflowMachine, WorkflowSnapshot};
pub use parts::{PartIdentifier, PlaceholderIdentifier};
pub use phase::WorkflowPhase;
pub use runtime::{CopilotHandle, CopilotRuntime, WorkflowOp};
pub use view::{select_view, should_show_voice_controls, ViewKind, ViewModel};
