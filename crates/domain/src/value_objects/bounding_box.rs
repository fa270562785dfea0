//! Normalized bounding box value object
//!
//! Coordinates are fractions of the image dimensions, so every field lies in
//! `[0, 1]` and the box never extends past the right or bottom edge.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::BoundingBox;
//!
//! // A 100x50 box at (320, 240) in a 640x480 image
//! let bbox = BoundingBox::from_pixels(320.0, 240.0, 100.0, 50.0, 640, 480, 0.9);
//! assert!((bbox.x() - 0.5).abs() < 1e-6);
//! assert!((bbox.y() - 0.5).abs() < 1e-6);
//!
//! // Out-of-range values are rejected by the checked constructor
//! assert!(BoundingBox::new(0.9, 0.0, 0.5, 0.5, 0.8).is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Tolerance for `x + width` and `y + height` exceeding 1
pub const EDGE_EPSILON: f32 = 1e-4;

/// Axis-aligned box normalized to the image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    confidence: f32,
}

fn unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl BoundingBox {
    /// Create a validated box from normalized coordinates
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBoundingBox` if any field is outside
    /// `[0, 1]` or the box extends past the image edge.
    pub fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        confidence: f32,
    ) -> Result<Self, DomainError> {
        if ![x, y, width, height, confidence].into_iter().all(unit) {
            return Err(DomainError::InvalidBoundingBox(format!(
                "fields must be in [0, 1]: x={x}, y={y}, w={width}, h={height}, c={confidence}"
            )));
        }
        if x + width > 1.0 + EDGE_EPSILON || y + height > 1.0 + EDGE_EPSILON {
            return Err(DomainError::InvalidBoundingBox(format!(
                "box extends past the image edge: x+w={}, y+h={}",
                x + width,
                y + height
            )));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            confidence,
        })
    }

    /// Normalize a pixel-space box, clipping it to the image
    ///
    /// Never fails: the box is clipped to the image rectangle, and a zero
    /// image dimension yields an empty box at the origin.
    #[must_use]
    pub fn from_pixels(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        image_width: u32,
        image_height: u32,
        confidence: f32,
    ) -> Self {
        if image_width == 0 || image_height == 0 {
            return Self {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                confidence: clamp_unit(confidence),
            };
        }
        let img_w = image_width as f32;
        let img_h = image_height as f32;

        let x0 = clamp_unit(left / img_w);
        let y0 = clamp_unit(top / img_h);
        let x1 = clamp_unit((left + width) / img_w).max(x0);
        let y1 = clamp_unit((top + height) / img_h).max(y0);

        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
            confidence: clamp_unit(confidence),
        }
    }

    pub const fn x(&self) -> f32 {
        self.x
    }

    pub const fn y(&self) -> f32 {
        self.y
    }

    pub const fn width(&self) -> f32 {
        self.width
    }

    pub const fn height(&self) -> f32 {
        self.height
    }

    pub const fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Fraction of the image covered by the box
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Whether all invariants hold (useful after deserialization)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height, self.confidence]
            .into_iter()
            .all(unit)
            && self.x + self.width <= 1.0 + EDGE_EPSILON
            && self.y + self.height <= 1.0 + EDGE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_unit_box() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0, 1.0).unwrap();
        assert!((bbox.area() - 1.0).abs() < f32::EPSILON);
        assert!(bbox.is_valid());
    }

    #[test]
    fn new_rejects_negative_fields() {
        assert!(BoundingBox::new(-0.1, 0.0, 0.2, 0.2, 0.5).is_err());
        assert!(BoundingBox::new(0.1, 0.1, 0.2, 0.2, 1.2).is_err());
    }

    #[test]
    fn new_rejects_overflowing_edge() {
        let err = BoundingBox::new(0.6, 0.0, 0.5, 0.1, 0.5).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBoundingBox(_)));
    }

    #[test]
    fn from_pixels_normalizes() {
        let bbox = BoundingBox::from_pixels(64.0, 48.0, 320.0, 240.0, 640, 480, 0.75);
        assert!((bbox.x() - 0.1).abs() < 1e-6);
        assert!((bbox.y() - 0.1).abs() < 1e-6);
        assert!((bbox.width() - 0.5).abs() < 1e-6);
        assert!((bbox.height() - 0.5).abs() < 1e-6);
        assert!((bbox.confidence() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn from_pixels_clips_to_image() {
        let bbox = BoundingBox::from_pixels(600.0, -20.0, 200.0, 100.0, 640, 480, 0.9);
        assert!(bbox.is_valid());
        assert!((bbox.x() + bbox.width() - 1.0).abs() < 1e-6);
        assert!(bbox.y().abs() < f32::EPSILON);
    }

    #[test]
    fn from_pixels_handles_zero_dimensions() {
        let bbox = BoundingBox::from_pixels(10.0, 10.0, 5.0, 5.0, 0, 480, 0.9);
        assert!(bbox.area().abs() < f32::EPSILON);
        assert!(bbox.is_valid());
    }

    #[test]
    fn from_pixels_clamps_nan_confidence() {
        let bbox = BoundingBox::from_pixels(0.0, 0.0, 1.0, 1.0, 10, 10, f32::NAN);
        assert!(bbox.confidence().abs() < f32::EPSILON);
    }
}
