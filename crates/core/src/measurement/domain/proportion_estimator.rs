//! Proportion formula set: a crude no-landmark heuristic.
//!
//! Assumes a centered, frontal subject filling most of the frame and reads
//! every width off the image width alone. Pixel content is never inspected.
//! It exists so the service still answers when pose detection is
//! unavailable; expect errors of several centimeters.

use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::pixel_measurements::{MeasurementMode, PixelMeasurements};
use super::pixel_measurer::PixelMeasurer;

/// Shoulder width as a fraction of image width.
pub const SHOULDER_TO_IMAGE_WIDTH: f64 = 0.35;
pub const CHEST_TO_SHOULDER: f64 = 0.95;
pub const WAIST_TO_SHOULDER: f64 = 0.75;
pub const HIP_TO_SHOULDER: f64 = 0.98;
/// Body height as a fraction of image height.
pub const BODY_TO_IMAGE_HEIGHT: f64 = 0.9;

pub fn estimate_proportions(width: u32, height: u32) -> PixelMeasurements {
    let shoulder_width_px = width as f64 * SHOULDER_TO_IMAGE_WIDTH;
    PixelMeasurements {
        shoulder_width_px,
        chest_width_px: shoulder_width_px * CHEST_TO_SHOULDER,
        waist_width_px: shoulder_width_px * WAIST_TO_SHOULDER,
        hip_width_px: shoulder_width_px * HIP_TO_SHOULDER,
        body_height_px: height as f64 * BODY_TO_IMAGE_HEIGHT,
        torso_height_px: None,
        mode: MeasurementMode::Proportions,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionEstimator;

impl PixelMeasurer for ProportionEstimator {
    fn mode(&self) -> MeasurementMode {
        MeasurementMode::Proportions
    }

    fn measure(&self, frame: &Frame) -> Result<PixelMeasurements, MeasureError> {
        Ok(estimate_proportions(frame.width(), frame.height()))
    }
}
