//! Shared state and messaging between the UI and the scan worker
//!
//! The UI owns the document selection and the displayed results; the worker
//! reads the selection and reports back over a channel.

pub mod messages;
pub mod state;

pub use messages::{PipelineToUi, ScanResult};
pub use state::{DocumentSelection, ScanDisplay, SelectedDocument};
