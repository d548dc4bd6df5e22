//! Frame data structures for captured camera content

use image::{DynamicImage, GrayImage, RgbaImage};
use std::fmt;
use thiserror::Error;

use crate::vision::PixelRect;

/// Layout of a frame's pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 4 bytes per pixel, RGBA order
    Rgba8,
    /// 1 byte per pixel, e.g. the luma plane of a YUV camera frame
    Luma8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Luma8 => 1,
        }
    }
}

/// Errors raised when reading a frame's pixel buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("pixel buffer holds {actual} bytes, {expected} expected for {width}x{height}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("crop region {region:?} exceeds frame {width}x{height}")]
    RegionOutOfBounds {
        region: PixelRect,
        width: u32,
        height: u32,
    },
}

/// Callback returning the frame's buffer to the camera layer
pub type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A captured camera frame
///
/// The frame owns its pixel buffer. An optional release hook runs exactly once
/// when the frame is dropped, whichever way the recognition cycle ends.
pub struct CapturedFrame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Buffer width in pixels
    pub width: u32,
    /// Buffer height in pixels
    pub height: u32,
    /// Clockwise rotation that brings the buffer upright
    pub rotation_degrees: i32,
    on_release: Option<ReleaseHook>,
}

impl CapturedFrame {
    /// Create a new upright RGBA frame
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::with_format(data, PixelFormat::Rgba8, width, height)
    }

    pub fn with_format(data: Vec<u8>, format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            data,
            format,
            width,
            height,
            rotation_degrees: 0,
            on_release: None,
        }
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(luma) => Self::with_format(
                luma.as_raw().clone(),
                PixelFormat::Luma8,
                luma.width(),
                luma.height(),
            ),
            other => {
                let rgba = other.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self::new(rgba.into_raw(), width, height)
            }
        }
    }

    pub fn with_rotation(mut self, rotation_degrees: i32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    /// Register the callback that hands the buffer back to its producer
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn on_release(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Copy the given region out of the frame. The region must lie inside
    /// the frame, which [`RoiMapper`](crate::vision::RoiMapper) guarantees.
    pub fn crop(&self, region: PixelRect) -> Result<DynamicImage, FrameError> {
        let expected = self.width as usize * self.height as usize * self.format.bytes_per_pixel();
        let size_error = || FrameError::BufferSize {
            width: self.width,
            height: self.height,
            expected,
            actual: self.data.len(),
        };
        if self.data.len() != expected {
            return Err(size_error());
        }
        if region.right() > self.width || region.bottom() > self.height {
            return Err(FrameError::RegionOutOfBounds {
                region,
                width: self.width,
                height: self.height,
            });
        }

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = region.width as usize * bpp;
        let mut pixels = Vec::with_capacity(row_bytes * region.height as usize);
        for row in region.top..region.bottom() {
            let start = (row as usize * self.width as usize + region.left as usize) * bpp;
            pixels.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        let image = match self.format {
            PixelFormat::Rgba8 => RgbaImage::from_raw(region.width, region.height, pixels)
                .map(DynamicImage::ImageRgba8),
            PixelFormat::Luma8 => GrayImage::from_raw(region.width, region.height, pixels)
                .map(DynamicImage::ImageLuma8),
        };

        image.ok_or_else(size_error)
    }
}

impl fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Drop for CapturedFrame {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}
