//! One recognition cycle
//!
//! crop -> recognize -> normalize -> extract/filter, strictly in that order.
//! The worker checks for a stale selection between recognition and analysis.

use std::time::Instant;
use thiserror::Error;
use tracing::debug;

use crate::analysis::{self, FieldMap};
use crate::capture::{CapturedFrame, FrameError};
use crate::document::{DocumentType, Rotation};
use crate::vision::{
    completion, RecognitionRequest, RecognitionResult, Recognizer, RecognizerError, RoiError,
    RoiMapper,
};

/// Reasons a cycle ends without a result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleError {
    #[error(transparent)]
    Roi(#[from] RoiError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
}

/// Settings shared by every cycle
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub mapper: RoiMapper,
    /// Script hint forwarded to the recognizer
    pub languages: Vec<String>,
    /// Produce the cleaned transcript for documents that define one
    pub noise_filter: bool,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            mapper: RoiMapper::default(),
            languages: vec!["ko-KR".to_string(), "en-US".to_string()],
            noise_filter: true,
        }
    }
}

/// Analysis of one recognition result
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub raw_text: String,
    pub normalized: String,
    pub fields: FieldMap,
    pub transcript: Option<String>,
}

/// Crop the document region out of `frame` and wait for the recognizer
pub fn recognize_region(
    frame: &CapturedFrame,
    document: &DocumentType,
    settings: &CycleSettings,
    recognizer: &dyn Recognizer,
) -> Result<RecognitionResult, CycleError> {
    let region = settings.mapper.map_rotated(
        &document.roi(),
        frame.width,
        frame.height,
        frame.rotation_degrees,
    )?;
    let image = frame.crop(region)?;
    debug!(?region, document = %document.kind(), "Cropped region of interest");

    let rotation = if settings.mapper.assumes_portrait_input {
        Rotation::Deg0
    } else {
        Rotation::from_degrees(frame.rotation_degrees).unwrap_or_default()
    };

    let start = Instant::now();
    let (reply, pending) = completion();
    recognizer.recognize(
        RecognitionRequest {
            image,
            rotation,
            languages: settings.languages.clone(),
        },
        reply,
    );
    let result = pending.wait()?;
    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        lines = result.lines.len(),
        "Recognition complete"
    );

    Ok(result)
}

/// Turn raw recognizer text into fields and the cleaned transcript
pub fn analyze(raw_text: &str, document: &DocumentType, settings: &CycleSettings) -> CycleOutput {
    let normalized = analysis::normalize(raw_text);
    let fields = analysis::extract(&normalized, document);
    let transcript = document
        .noise_script()
        .filter(|_| settings.noise_filter)
        .map(|script| analysis::filter(raw_text, script));

    CycleOutput {
        raw_text: raw_text.to_string(),
        normalized,
        fields,
        transcript,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{fields, DocumentKind};
    use crate::vision::ocr::RecognitionReply;
    use crate::vision::StaticRecognizer;
    use parking_lot::Mutex;

    /// Records the requests it receives
    #[derive(Default)]
    struct RecordingRecognizer {
        seen: Mutex<Vec<(u32, u32, Rotation)>>,
    }

    impl Recognizer for RecordingRecognizer {
        fn recognize(&self, request: RecognitionRequest, reply: RecognitionReply) {
            self.seen
                .lock()
                .push((request.image.width(), request.image.height(), request.rotation));
            reply.complete(Ok(RecognitionResult::from_text("12/25")));
        }
    }

    fn frame(width: u32, height: u32) -> CapturedFrame {
        CapturedFrame::new(vec![0; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn test_recognizer_sees_cropped_region() {
        let recognizer = RecordingRecognizer::default();
        let card = DocumentType::builtin(DocumentKind::Card);
        let result =
            recognize_region(&frame(200, 400), &card, &CycleSettings::default(), &recognizer).unwrap();
        assert_eq!(result.text, "12/25");
        // 0.075..0.925 of 200 wide, 0.4..0.6 of 400 tall
        assert_eq!(recognizer.seen.lock()[0], (170, 80, Rotation::Deg0));
    }

    #[test]
    fn test_rotated_frame_passes_rotation() {
        let recognizer = RecordingRecognizer::default();
        let card = DocumentType::builtin(DocumentKind::Card);
        let frame = frame(400, 200).with_rotation(90);
        recognize_region(&frame, &card, &CycleSettings::default(), &recognizer).unwrap();
        // the crop is taken in buffer orientation: tall and narrow
        assert_eq!(recognizer.seen.lock()[0], (80, 170, Rotation::Deg90));
    }

    #[test]
    fn test_zero_sized_frame() {
        let card = DocumentType::builtin(DocumentKind::Card);
        let err = recognize_region(
            &frame(0, 0),
            &card,
            &CycleSettings::default(),
            &StaticRecognizer::new("x"),
        )
        .unwrap_err();
        assert!(matches!(err, CycleError::Roi(RoiError::InvalidDimensions { .. })));
    }

    #[test]
    fn test_recognizer_failure_propagates() {
        let card = DocumentType::builtin(DocumentKind::Card);
        let err = recognize_region(
            &frame(10, 10),
            &card,
            &CycleSettings::default(),
            &StaticRecognizer::failing(),
        )
        .unwrap_err();
        assert!(matches!(err, CycleError::Recognizer(RecognizerError::Failed(_))));
    }

    #[test]
    fn test_analyze_license_with_transcript() {
        let license = DocumentType::builtin(DocumentKind::License);
        let raw = "운전면허증\n12-34-567890-12\n990101";
        let output = analyze(raw, &license, &CycleSettings::default());
        assert_eq!(output.normalized, "운전면허증 12-34-567890-12 990101");
        assert_eq!(output.fields.value(fields::LICENSE_NUMBER), Some("12-34-567890-12"));
        assert_eq!(output.fields.value(fields::BIRTH_DATE), Some("990101"));
        assert_eq!(output.transcript.as_deref(), Some("12-34-567890-12\n990101"));
    }

    #[test]
    fn test_analyze_card_has_no_transcript() {
        let card = DocumentType::builtin(DocumentKind::Card);
        let output = analyze("1234 5678 9012 3456", &card, &CycleSettings::default());
        assert!(output.transcript.is_none());
    }

    #[test]
    fn test_noise_filter_can_be_disabled() {
        let license = DocumentType::builtin(DocumentKind::License);
        let settings = CycleSettings {
            noise_filter: false,
            ..Default::default()
        };
        assert!(analyze("990101", &license, &settings).transcript.is_none());
    }
}
