//! Region-of-interest mapping
//!
//! Turns a document's normalized capture region into a pixel crop rectangle
//! for a concrete frame, clamped so it always lies inside the image.

use serde::Serialize;
use thiserror::Error;

use crate::document::{NormalizedRect, Rotation};

/// Errors that make a single frame unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoiError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("unsupported frame rotation of {0} degrees")]
    InvalidRotation(i32),
}

/// Crop rectangle in integer pixels, fully inside its image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// Maps normalized regions to pixel crops
#[derive(Debug, Clone, Copy, Default)]
pub struct RoiMapper {
    /// Frames arrive already rotated upright; rotation metadata is ignored
    pub assumes_portrait_input: bool,
}

impl RoiMapper {
    pub fn new(assumes_portrait_input: bool) -> Self {
        Self { assumes_portrait_input }
    }

    /// Map `rect` onto an upright image of the given size
    pub fn map(
        &self,
        rect: &NormalizedRect,
        image_width: u32,
        image_height: u32,
    ) -> Result<PixelRect, RoiError> {
        if image_width == 0 || image_height == 0 {
            return Err(RoiError::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }

        let (left, width) = map_axis(rect.left(), rect.right(), image_width);
        let (top, height) = map_axis(rect.top(), rect.bottom(), image_height);

        Ok(PixelRect { left, top, width, height })
    }

    /// Map `rect` onto a frame buffer whose pixels must be rotated clockwise
    /// by `rotation_degrees` to appear upright
    pub fn map_rotated(
        &self,
        rect: &NormalizedRect,
        image_width: u32,
        image_height: u32,
        rotation_degrees: i32,
    ) -> Result<PixelRect, RoiError> {
        if self.assumes_portrait_input {
            return self.map(rect, image_width, image_height);
        }

        let rotation =
            Rotation::from_degrees(rotation_degrees).ok_or(RoiError::InvalidRotation(rotation_degrees))?;
        self.map(&rect.rotated(rotation), image_width, image_height)
    }
}

/// Round both edges, derive the extent by subtraction, then clamp
fn map_axis(start: f32, end: f32, size: u32) -> (u32, u32) {
    let size = i64::from(size);
    let start_px = (f64::from(start) * size as f64).round() as i64;
    let end_px = (f64::from(end) * size as f64).round() as i64;

    let start_px = start_px.clamp(0, size - 1);
    let extent = (end_px - start_px).clamp(1, size - start_px);

    (start_px as u32, extent as u32)
}
