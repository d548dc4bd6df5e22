//! Frame Capture Layer
//!
//! The camera session itself lives outside this crate. Frames arrive as
//! [`CapturedFrame`] descriptors; [`StillImageSource`] replays a still image
//! at camera rate so the pipeline can be driven from the command line.

pub mod frame;

pub use frame::{CapturedFrame, FrameError};

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Frame replay configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Frames per second to emit
    pub max_fps: u32,
    /// Number of frames to emit
    pub frame_count: u32,
    /// Rotation reported with every frame
    pub rotation_degrees: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_fps: 30,
            frame_count: 1,
            rotation_degrees: 0,
        }
    }
}

/// Replays a still image as a stream of camera frames
pub struct StillImageSource {
    image: DynamicImage,
    config: CaptureConfig,
}

impl StillImageSource {
    pub fn new(image: DynamicImage, config: CaptureConfig) -> Self {
        Self { image, config }
    }

    /// Load the image to replay from disk
    pub fn open(path: &Path, config: CaptureConfig) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        Ok(Self::new(image, config))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// One frame of the replayed image
    pub fn frame(&self) -> CapturedFrame {
        CapturedFrame::from_image(&self.image).with_rotation(self.config.rotation_degrees)
    }

    /// Emit frames at the configured rate, handing each to `sink`
    pub fn run(&self, mut sink: impl FnMut(CapturedFrame)) {
        let interval = Duration::from_secs(1) / self.config.max_fps.max(1);
        let mut next = Instant::now();

        for index in 0..self.config.frame_count {
            let frame = self.frame();
            debug!(index, "Emitting frame");
            sink(frame);

            next += interval;
            if let Some(wait) = next.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }
}
