//! Document types
//!
//! Each supported document carries its display label, the capture region on
//! screen, and the ordered field schema the extraction engine fills in.

pub mod rect;

pub use rect::{NormalizedRect, Rotation};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::analysis::rules;
use crate::analysis::{ExtractionRule, NativeScript};

/// Field names used in the built-in schemas
pub mod fields {
    pub const CARD_NUMBER: &str = "card_number";
    pub const CARD_EXPIRY: &str = "card_expiry";
    pub const LICENSE_NUMBER: &str = "license_number";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const RESIDENT_NUMBER_PREFIX: &str = "resident_number_prefix";
    pub const ISSUE_DATE: &str = "issue_date";
    pub const RENEWAL_EXPIRY: &str = "renewal_expiry";
    pub const SERIAL: &str = "serial";
}

/// Supported document variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Payment card
    #[default]
    Card,
    /// Driver's license
    License,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Card, DocumentKind::License];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Card => "card",
            DocumentKind::License => "license",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named field and the rules that can fill it, in priority order
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rules: Vec<ExtractionRule>,
}

impl FieldSpec {
    fn new(name: &'static str, rules: Vec<ExtractionRule>) -> Self {
        Self { name, rules }
    }
}

/// A document type: label, capture region and field schema
///
/// Built once at startup and shared behind an `Arc`; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DocumentType {
    kind: DocumentKind,
    label: &'static str,
    roi: NormalizedRect,
    fields: Vec<FieldSpec>,
    noise_script: Option<NativeScript>,
}

impl DocumentType {
    /// The built-in definition for a document kind
    pub fn builtin(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Card => Self {
                kind,
                label: "카드",
                roi: NormalizedRect::from_static(0.075, 0.4, 0.925, 0.6),
                fields: vec![
                    FieldSpec::new(fields::CARD_NUMBER, rules::card_number_rules()),
                    FieldSpec::new(fields::CARD_EXPIRY, rules::card_expiry_rules()),
                ],
                noise_script: None,
            },
            DocumentKind::License => Self {
                kind,
                label: "운전면허증",
                roi: NormalizedRect::from_static(0.075, 0.3, 0.925, 0.7),
                fields: vec![
                    FieldSpec::new(fields::LICENSE_NUMBER, rules::license_number_rules()),
                    FieldSpec::new(fields::BIRTH_DATE, rules::six_digit_rules()),
                    FieldSpec::new(fields::RESIDENT_NUMBER_PREFIX, rules::six_digit_rules()),
                    FieldSpec::new(fields::ISSUE_DATE, rules::issue_date_rules()),
                    FieldSpec::new(fields::RENEWAL_EXPIRY, rules::renewal_expiry_rules()),
                    FieldSpec::new(fields::SERIAL, rules::serial_rules()),
                ],
                noise_script: Some(NativeScript::Hangul),
            },
        }
    }

    /// Replace the capture region, e.g. from a configuration override
    pub fn with_roi(mut self, roi: NormalizedRect) -> Self {
        self.roi = roi;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn roi(&self) -> NormalizedRect {
        self.roi
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in schema order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Script stripped by the noise filter; `None` when the document has no
    /// filtered transcript
    pub fn noise_script(&self) -> Option<NativeScript> {
        self.noise_script
    }
}

/// The document types available for selection, built once at startup
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    documents: HashMap<DocumentKind, Arc<DocumentType>>,
}

impl DocumentCatalog {
    pub fn builtin() -> Self {
        let documents = DocumentKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(DocumentType::builtin(kind))))
            .collect();
        Self { documents }
    }

    /// Replace the capture region of one document kind
    pub fn with_roi(mut self, kind: DocumentKind, roi: NormalizedRect) -> Self {
        let document = DocumentType::builtin(kind).with_roi(roi);
        self.documents.insert(kind, Arc::new(document));
        self
    }

    pub fn get(&self, kind: DocumentKind) -> Arc<DocumentType> {
        self.documents
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(DocumentType::builtin(kind)))
    }
}

impl Default for DocumentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
