//! Shared state between the UI thread and the scan worker

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::analysis::FieldMap;
use crate::document::{DocumentKind, DocumentType};
use crate::shared::messages::ScanResult;

/// A published document selection
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    pub document: Arc<DocumentType>,
    /// Incremented on every change of document kind
    pub generation: u64,
}

/// Current document type, written by the UI and read by the worker
///
/// The document and its generation are swapped together under one lock, so
/// readers never observe a half-updated selection.
#[derive(Debug)]
pub struct DocumentSelection {
    current: RwLock<SelectedDocument>,
}

impl DocumentSelection {
    pub fn new(document: Arc<DocumentType>) -> Self {
        Self {
            current: RwLock::new(SelectedDocument {
                document,
                generation: 0,
            }),
        }
    }

    /// Publish a new selection. Re-selecting the current kind is a no-op.
    /// Returns the generation now in effect.
    pub fn select(&self, document: Arc<DocumentType>) -> u64 {
        let mut current = self.current.write();
        if current.document.kind() == document.kind() {
            return current.generation;
        }
        info!(from = %current.document.kind(), to = %document.kind(), "Document type changed");
        current.document = document;
        current.generation += 1;
        current.generation
    }

    pub fn snapshot(&self) -> SelectedDocument {
        self.current.read().clone()
    }

    /// Whether a cycle started under `generation` is still valid
    pub fn is_current(&self, generation: u64) -> bool {
        self.current.read().generation == generation
    }
}

/// What the UI shows for the active document
#[derive(Debug, Clone, Default)]
pub struct ScanDisplay {
    /// Document kind the UI is in
    pub document: DocumentKind,
    /// Latest field map; replaced wholesale by each new result
    pub fields: Option<FieldMap>,
    /// Latest cleaned transcript
    pub transcript: Option<String>,
    /// Number of results applied
    pub updates: u64,
}

impl ScanDisplay {
    pub fn new(document: DocumentKind) -> Self {
        Self {
            document,
            ..Default::default()
        }
    }

    /// Switch document mode, clearing what was shown for the previous one
    pub fn set_document(&mut self, document: DocumentKind) {
        if self.document != document {
            *self = Self::new(document);
        }
    }

    /// Apply a worker result. Results for another document kind are ignored.
    pub fn apply(&mut self, result: ScanResult) -> bool {
        if result.document != self.document {
            return false;
        }
        self.fields = Some(result.fields);
        self.transcript = result.transcript;
        self.updates += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract;

    fn document(kind: DocumentKind) -> Arc<DocumentType> {
        Arc::new(DocumentType::builtin(kind))
    }

    fn result(kind: DocumentKind, text: &str) -> ScanResult {
        ScanResult {
            document: kind,
            generation: 0,
            fields: extract(text, &DocumentType::builtin(kind)),
            transcript: None,
            raw_text: text.to_string(),
        }
    }

    #[test]
    fn test_select_bumps_generation_on_change() {
        let selection = DocumentSelection::new(document(DocumentKind::Card));
        assert_eq!(selection.snapshot().generation, 0);

        assert_eq!(selection.select(document(DocumentKind::Card)), 0);
        assert_eq!(selection.select(document(DocumentKind::License)), 1);
        assert!(!selection.is_current(0));
        assert!(selection.is_current(1));
        assert_eq!(selection.snapshot().document.kind(), DocumentKind::License);
    }

    #[test]
    fn test_round_trip_selection_is_still_a_change() {
        let selection = DocumentSelection::new(document(DocumentKind::Card));
        selection.select(document(DocumentKind::License));
        selection.select(document(DocumentKind::Card));
        assert!(!selection.is_current(0));
        assert_eq!(selection.snapshot().generation, 2);
    }

    #[test]
    fn test_display_replaces_fields_wholesale() {
        let mut display = ScanDisplay::new(DocumentKind::Card);
        assert!(display.apply(result(DocumentKind::Card, "1234 5678 9012 3456 12/25")));
        assert!(display.apply(result(DocumentKind::Card, "09/30")));

        let fields = display.fields.as_ref().unwrap();
        // no carry-over of the earlier card number
        assert_eq!(fields.value("card_number"), None);
        assert_eq!(fields.value("card_expiry"), Some("09/30"));
        assert_eq!(display.updates, 2);
    }

    #[test]
    fn test_display_ignores_other_document() {
        let mut display = ScanDisplay::new(DocumentKind::License);
        assert!(!display.apply(result(DocumentKind::Card, "1234 5678 9012 3456")));
        assert!(display.fields.is_none());
    }

    #[test]
    fn test_set_document_clears() {
        let mut display = ScanDisplay::new(DocumentKind::Card);
        display.apply(result(DocumentKind::Card, "12/25"));
        display.set_document(DocumentKind::License);
        assert!(display.fields.is_none());
        assert_eq!(display.updates, 0);
    }
}
