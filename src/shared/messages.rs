//! Message types for communication between the scan worker and the UI

use serde::Serialize;

use crate::analysis::FieldMap;
use crate::document::DocumentKind;

/// Outcome of one successful recognition cycle
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Document type the fields were extracted for
    pub document: DocumentKind,
    /// Selection generation the cycle ran under
    pub generation: u64,
    /// Extracted fields, one entry per schema field
    pub fields: FieldMap,
    /// Cleaned transcript, for documents with a noise filter
    pub transcript: Option<String>,
    /// Recognizer output before normalization
    pub raw_text: String,
}

/// Messages sent from the scan worker to the UI thread
#[derive(Debug, Clone)]
pub enum PipelineToUi {
    /// A cycle produced a fresh field map
    Recognized(ScanResult),
    /// The worker has exited
    Stopped,
}
