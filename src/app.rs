//! Application Coordinator
//!
//! Owns the document selection, the scan pipeline and the UI-side display
//! state. Lives on the UI thread; results from the worker are applied here.

use anyhow::Result;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::capture::CapturedFrame;
use crate::config::AppConfig;
use crate::document::{DocumentCatalog, DocumentKind};
use crate::pipeline::{GateStats, ScanPipeline, Submission};
use crate::shared::{DocumentSelection, PipelineToUi, ScanDisplay};
use crate::vision::Recognizer;

/// Main application coordinator
pub struct ScannerApp {
    catalog: DocumentCatalog,
    selection: Arc<DocumentSelection>,
    pipeline: ScanPipeline,
    from_pipeline: Receiver<PipelineToUi>,
    /// What the UI currently shows
    pub display: ScanDisplay,
}

impl ScannerApp {
    /// Create the coordinator and start the scan worker
    pub fn new(config: &AppConfig, recognizer: Arc<dyn Recognizer>) -> Result<Self> {
        let catalog = config.roi.catalog();
        let initial = config.general.default_document;
        let selection = Arc::new(DocumentSelection::new(catalog.get(initial)));

        let (pipeline, from_pipeline) = ScanPipeline::spawn(
            config.pipeline.cycle_settings(),
            recognizer,
            selection.clone(),
        )?;
        info!(document = %initial, "Scanner started");

        Ok(Self {
            catalog,
            selection,
            pipeline,
            from_pipeline,
            display: ScanDisplay::new(initial),
        })
    }

    /// Switch the active document type
    pub fn select_document(&mut self, kind: DocumentKind) {
        self.selection.select(self.catalog.get(kind));
        self.display.set_document(kind);
    }

    /// Offer a camera frame to the pipeline
    pub fn submit_frame(&self, frame: CapturedFrame) -> Submission {
        self.pipeline.submit(frame)
    }

    /// Apply every pending worker result to the display. Returns the number
    /// of results applied.
    pub fn poll_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.from_pipeline.try_recv() {
            if self.handle_message(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the pipeline is idle, then apply pending results
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pipeline.gate().is_busy() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        self.poll_updates();
        true
    }

    /// Stop the worker once the in-flight cycle is done and return the
    /// final display state
    pub fn shutdown(mut self) -> ScanDisplay {
        self.poll_updates();
        let Self {
            pipeline,
            from_pipeline,
            mut display,
            ..
        } = self;

        pipeline.shutdown();
        for message in from_pipeline.try_iter() {
            if let PipelineToUi::Recognized(result) = message {
                display.apply(result);
            }
        }
        let updates = display.updates;
        info!(updates, "Scanner stopped");
        display
    }

    fn handle_message(&mut self, message: PipelineToUi) -> bool {
        match message {
            PipelineToUi::Recognized(result) => self.display.apply(result),
            PipelineToUi::Stopped => {
                info!("Scan worker stopped");
                false
            }
        }
    }

    pub fn stats(&self) -> GateStats {
        self.pipeline.stats()
    }
}
