//! Scan Pipeline
//!
//! Runs recognition cycles on a single background worker. The frame gate
//! admits one frame at a time; everything offered meanwhile is dropped.
//! Results go back to the UI thread over a channel.

pub mod cycle;
pub mod gate;

pub use cycle::{analyze, recognize_region, CycleError, CycleSettings};
pub use gate::{FrameGate, GatePermit, GateStats};

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::capture::CapturedFrame;
use crate::shared::{DocumentSelection, PipelineToUi, ScanResult, SelectedDocument};
use crate::vision::Recognizer;

/// Whether a submitted frame entered the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    Dropped,
}

/// An admitted frame on its way to the worker
struct Job {
    frame: CapturedFrame,
    selected: SelectedDocument,
    permit: GatePermit,
}

/// Handle to the background scan worker
pub struct ScanPipeline {
    gate: Arc<FrameGate>,
    selection: Arc<DocumentSelection>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl ScanPipeline {
    /// Start the worker thread. Returns the pipeline handle and the receiver
    /// the UI thread drains for results.
    pub fn spawn(
        settings: CycleSettings,
        recognizer: Arc<dyn Recognizer>,
        selection: Arc<DocumentSelection>,
    ) -> Result<(Self, Receiver<PipelineToUi>)> {
        // the gate guarantees at most one job exists at a time
        let (jobs_tx, jobs_rx) = bounded::<Job>(1);
        let (ui_tx, ui_rx) = unbounded();

        let worker_selection = selection.clone();
        let worker = std::thread::Builder::new()
            .name("scan-worker".into())
            .spawn(move || {
                info!("Scan worker starting...");
                for job in jobs_rx.iter() {
                    run_job(job, &settings, recognizer.as_ref(), &worker_selection, &ui_tx);
                }
                let _ = ui_tx.send(PipelineToUi::Stopped);
                info!("Scan worker exiting...");
            })
            .context("Failed to spawn scan worker thread")?;

        Ok((
            Self {
                gate: FrameGate::new(),
                selection,
                jobs: Some(jobs_tx),
                worker: Some(worker),
            },
            ui_rx,
        ))
    }

    /// Offer a frame. It is dropped, releasing its buffer, unless the
    /// pipeline is idle.
    pub fn submit(&self, frame: CapturedFrame) -> Submission {
        let Some(permit) = self.gate.try_acquire() else {
            trace!("Pipeline busy, dropping frame");
            return Submission::Dropped;
        };
        let Some(jobs) = &self.jobs else {
            return Submission::Dropped;
        };

        let job = Job {
            frame,
            selected: self.selection.snapshot(),
            permit,
        };
        match jobs.try_send(job) {
            Ok(()) => Submission::Accepted,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                warn!("Scan worker unavailable, dropping frame");
                Submission::Dropped
            }
        }
    }

    pub fn gate(&self) -> &Arc<FrameGate> {
        &self.gate
    }

    pub fn stats(&self) -> GateStats {
        self.gate.stats()
    }

    /// Stop accepting frames and wait for the in-flight cycle to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Scan worker panicked");
            }
        }
    }
}

impl Drop for ScanPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_job(
    job: Job,
    settings: &CycleSettings,
    recognizer: &dyn Recognizer,
    selection: &DocumentSelection,
    ui_tx: &Sender<PipelineToUi>,
) {
    let Job { frame, selected, permit } = job;
    let document = selected.document.as_ref();

    match recognize_region(&frame, document, settings, recognizer) {
        Ok(recognition) if recognition.text.trim().is_empty() => {
            // no text found; the previous result stays on screen
            debug!(document = %document.kind(), "Recognition returned no text");
        }
        Ok(recognition) => {
            if !selection.is_current(selected.generation) {
                debug!(
                    document = %document.kind(),
                    generation = selected.generation,
                    "Document changed during cycle, discarding result"
                );
            } else {
                let output = analyze(&recognition.text, document, settings);
                debug!(
                    document = %document.kind(),
                    recognized = output.fields.recognized_count(),
                    fields = output.fields.len(),
                    "Extracted fields"
                );
                let _ = ui_tx.send(PipelineToUi::Recognized(ScanResult {
                    document: document.kind(),
                    generation: selected.generation,
                    fields: output.fields,
                    transcript: output.transcript,
                    raw_text: output.raw_text,
                }));
            }
        }
        Err(CycleError::Recognizer(e)) => {
            warn!(error = %e, "Recognition produced no text");
        }
        Err(e) => {
            warn!(error = %e, "Skipping frame");
        }
    }

    // hand the buffer back before reopening the gate
    drop(frame);
    drop(permit);
}
