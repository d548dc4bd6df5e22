//! Text Analysis
//!
//! Turns raw recognizer output into structured fields and a cleaned
//! transcript.

pub mod extraction;
pub mod noise;
pub mod normalize;
pub mod rules;

pub use extraction::{extract, FieldMap};
pub use noise::{filter, NativeScript};
pub use normalize::normalize;
pub use rules::ExtractionRule;
