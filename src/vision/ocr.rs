//! Recognizer interface
//!
//! Text recognition is an external service. It receives a cropped image and
//! completes a single-shot reply with the recognized text, from whatever
//! thread it likes.

use crossbeam_channel::{bounded, Receiver, Sender};
use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

use crate::document::Rotation;
use crate::vision::PixelRect;

/// Failures reported by (or on behalf of) the recognizer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognizerError {
    #[error("recognition failed: {0}")]
    Failed(String),
    #[error("recognizer dropped the request without replying")]
    Abandoned,
}

/// Work handed to the recognizer for one cycle
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    /// Cropped region in buffer orientation
    pub image: DynamicImage,
    /// Clockwise rotation that brings `image` upright
    pub rotation: Rotation,
    /// Expected scripts, e.g. `["ko-KR", "en-US"]`
    pub languages: Vec<String>,
}

/// Single recognized line with optional geometry in crop coordinates.
/// Carried through for recognizers that report it; extraction works on `text`
/// of the whole result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(not(test), allow(dead_code))]
pub struct RecognizedLine {
    pub text: String,
    pub bounds: Option<PixelRect>,
    pub confidence: Option<f32>,
}

/// Recognizer output: raw multi-line text plus per-line detail
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionResult {
    pub text: String,
    pub lines: Vec<RecognizedLine>,
}

impl RecognitionResult {
    /// Build a result from plain text, one line per text line
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text
            .lines()
            .map(|line| RecognizedLine {
                text: line.to_string(),
                bounds: None,
                confidence: None,
            })
            .collect();
        Self { text, lines }
    }
}

/// Completion side of a recognition request. Consumed on use, so a request
/// completes at most once; dropping it unanswered reads as
/// [`RecognizerError::Abandoned`].
#[derive(Debug)]
pub struct RecognitionReply {
    tx: Sender<Result<RecognitionResult, RecognizerError>>,
}

impl RecognitionReply {
    pub fn complete(self, result: Result<RecognitionResult, RecognizerError>) {
        // the waiting cycle may already be gone during shutdown
        let _ = self.tx.send(result);
    }
}

/// Waiting side of a recognition request
#[derive(Debug)]
pub struct PendingRecognition {
    rx: Receiver<Result<RecognitionResult, RecognizerError>>,
}

impl PendingRecognition {
    /// Block until the recognizer replies. There is no timeout: a stalled
    /// recognizer stalls the cycle.
    pub fn wait(self) -> Result<RecognitionResult, RecognizerError> {
        self.rx.recv().unwrap_or(Err(RecognizerError::Abandoned))
    }
}

/// Create a linked reply/pending pair
pub fn completion() -> (RecognitionReply, PendingRecognition) {
    let (tx, rx) = bounded(1);
    (RecognitionReply { tx }, PendingRecognition { rx })
}

/// An external text recognizer
pub trait Recognizer: Send + Sync {
    /// Start recognizing `request`; complete `reply` exactly once when done
    fn recognize(&self, request: RecognitionRequest, reply: RecognitionReply);
}

/// Recognizer returning a fixed transcript, for replaying captured sessions
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    transcript: Option<String>,
}

impl StaticRecognizer {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: Some(transcript.into()),
        }
    }

    /// A recognizer that fails every request
    #[cfg(test)]
    pub fn failing() -> Self {
        Self { transcript: None }
    }
}

impl Recognizer for StaticRecognizer {
    fn recognize(&self, request: RecognitionRequest, reply: RecognitionReply) {
        debug!(
            width = request.image.width(),
            height = request.image.height(),
            rotation = request.rotation.degrees(),
            languages = ?request.languages,
            "Static recognition"
        );
        let result = match &self.transcript {
            Some(text) => Ok(RecognitionResult::from_text(text.clone())),
            None => Err(RecognizerError::Failed("no transcript available".to_string())),
        };
        reply.complete(result);
    }
}
