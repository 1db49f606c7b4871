use serde::{Deserialize, Serialize};
use std::fmt;

/// Height of the blank band at the bottom of the print the caption is centred in.
pub const BOTTOM_BAND_HEIGHT_PX: f32 = 350.0;

const POINTS_PER_PIXEL: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationGeometry {
    pub vertical_offset_px: i32,
}

impl AnnotationGeometry {
    pub fn compute(text_size_pt: i32, bottom_margin_px: i32) -> Self {
        Self {
            vertical_offset_px: compute_offset(text_size_pt, bottom_margin_px),
        }
    }
}

impl fmt::Display for AnnotationGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+0+{}", self.vertical_offset_px)
    }
}

/// Offset is truncated toward zero and may go negative for large inputs.
pub fn compute_offset(text_size_pt: i32, bottom_margin_px: i32) -> i32 {
    let text_px = (text_size_pt as f32 / POINTS_PER_PIXEL) / 2.0;
    let offset = (BOTTOM_BAND_HEIGHT_PX / 2.0) - (text_px / 2.0) - bottom_margin_px as f32;
    offset as i32
}
