//! Resolution-independent rectangles
//!
//! A capture region is expressed as fractions of the frame's width and height,
//! so the same definition works on any camera resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a [`NormalizedRect`]
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RectError {
    #[error("edge value is not finite")]
    NotFinite,
    #[error("horizontal edges out of order: left {left} must be < right {right} within [0, 1]")]
    Horizontal { left: f32, right: f32 },
    #[error("vertical edges out of order: top {top} must be < bottom {bottom} within [0, 1]")]
    Vertical { top: f32, bottom: f32 },
}

/// Frame rotation, clockwise, needed to bring a pixel buffer upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a rotation in degrees. Values are taken modulo 360 and must be
    /// a multiple of 90.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Rectangle given as fractions (0.0 - 1.0) of an image's dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RectFractions", into = "RectFractions")]
pub struct NormalizedRect {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

/// Unvalidated edge fractions, used as the serialized form
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RectFractions {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl TryFrom<RectFractions> for NormalizedRect {
    type Error = RectError;

    fn try_from(raw: RectFractions) -> Result<Self, Self::Error> {
        NormalizedRect::new(raw.left, raw.top, raw.right, raw.bottom)
    }
}

impl From<NormalizedRect> for RectFractions {
    fn from(rect: NormalizedRect) -> Self {
        Self {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        }
    }
}

impl NormalizedRect {
    /// Create a rectangle, enforcing `0 <= left < right <= 1` and
    /// `0 <= top < bottom <= 1`
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, RectError> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            return Err(RectError::NotFinite);
        }
        if !(0.0 <= left && left < right && right <= 1.0) {
            return Err(RectError::Horizontal { left, right });
        }
        if !(0.0 <= top && top < bottom && bottom <= 1.0) {
            return Err(RectError::Vertical { top, bottom });
        }
        Ok(Self { left, top, right, bottom })
    }

    /// Built-in document regions, known valid at compile time
    pub(crate) const fn from_static(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Express this upright rectangle in the coordinate frame of a buffer that
    /// must be rotated clockwise by `rotation` to appear upright.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        let Self { left, top, right, bottom } = *self;
        match rotation {
            Rotation::Deg0 => *self,
            // buffer (x, y) shows up upright at (1 - y, x)
            Rotation::Deg90 => Self {
                left: top,
                top: 1.0 - right,
                right: bottom,
                bottom: 1.0 - left,
            },
            Rotation::Deg180 => Self {
                left: 1.0 - right,
                top: 1.0 - bottom,
                right: 1.0 - left,
                bottom: 1.0 - top,
            },
            // buffer (x, y) shows up upright at (y, 1 - x)
            Rotation::Deg270 => Self {
                left: 1.0 - bottom,
                top: left,
                right: 1.0 - top,
                bottom: right,
            },
        }
    }
}
