//! Vision Layer
//!
//! Maps a document's capture region onto each frame and hands the crop to an
//! external text recognizer.

pub mod ocr;
pub mod roi;

pub use ocr::{
    completion, RecognitionRequest, RecognitionResult, Recognizer, RecognizerError,
    StaticRecognizer,
};
pub use roi::{PixelRect, RoiError, RoiMapper};
