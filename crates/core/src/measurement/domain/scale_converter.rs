//! Pixel-to-centimeter conversion from a known real height.
//!
//! The whole body shares one linear scale: `height_cm / body_height_px`.
//! Outputs are rounded for presentation (one decimal for lengths, three for
//! the ratio); the ratio is taken from the rounded lengths so it always
//! matches the numbers a caller sees.

use serde::Serialize;

use crate::shared::constants::{CM_DECIMALS, RATIO_DECIMALS};
use crate::shared::error::MeasureError;

use super::pixel_measurements::PixelMeasurements;

/// Centimeters per pixel for one image. Not reusable across images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(height_cm: f64, body_height_px: f64) -> Result<Self, MeasureError> {
        validate_user_height(height_cm)?;
        // Also rejects NaN.
        if !(body_height_px > 0.0) || !body_height_px.is_finite() {
            return Err(MeasureError::InvalidBodyHeight { body_height_px });
        }
        Ok(Self(height_cm / body_height_px))
    }

    pub fn cm_per_px(&self) -> f64 {
        self.0
    }

    pub fn to_cm(&self, px: f64) -> f64 {
        px * self.0
    }
}

/// Reject missing, non-finite, or non-positive heights before any
/// conversion runs.
pub fn validate_user_height(height_cm: f64) -> Result<(), MeasureError> {
    if height_cm.is_finite() && height_cm > 0.0 {
        Ok(())
    } else {
        Err(MeasureError::InvalidUserHeight(height_cm))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentimeterMeasurements {
    pub shoulders_cm: f64,
    pub bust_cm: f64,
    pub waist_cm: f64,
    pub hips_cm: f64,
    pub waist_to_hip_ratio: f64,
    /// The user-supplied height, echoed unrounded.
    pub height_cm: f64,
    pub torso_height_cm: Option<f64>,
}

impl CentimeterMeasurements {
    /// Unrounded conversion; exactly linear in the scale.
    pub fn scaled(px: &PixelMeasurements, scale: ScaleFactor, height_cm: f64) -> Self {
        let waist_cm = scale.to_cm(px.waist_width_px);
        let hips_cm = scale.to_cm(px.hip_width_px);
        Self {
            shoulders_cm: scale.to_cm(px.shoulder_width_px),
            bust_cm: scale.to_cm(px.chest_width_px),
            waist_cm,
            hips_cm,
            waist_to_hip_ratio: waist_to_hip(waist_cm, hips_cm),
            height_cm,
            torso_height_cm: px.torso_height_px.map(|t| scale.to_cm(t)),
        }
    }

    pub fn rounded(&self) -> Self {
        let waist_cm = round_to(self.waist_cm, CM_DECIMALS);
        let hips_cm = round_to(self.hips_cm, CM_DECIMALS);
        Self {
            shoulders_cm: round_to(self.shoulders_cm, CM_DECIMALS),
            bust_cm: round_to(self.bust_cm, CM_DECIMALS),
            waist_cm,
            hips_cm,
            waist_to_hip_ratio: round_to(waist_to_hip(waist_cm, hips_cm), RATIO_DECIMALS),
            height_cm: self.height_cm,
            torso_height_cm: self.torso_height_cm.map(|t| round_to(t, CM_DECIMALS)),
        }
    }
}

/// Convert a pixel measurement set to rounded centimeters.
pub fn convert(px: &PixelMeasurements, height_cm: f64) -> Result<CentimeterMeasurements, MeasureError> {
    let scale = ScaleFactor::new(height_cm, px.body_height_px)?;
    log::debug!("Scale: {:.5} cm/px", scale.cm_per_px());
    Ok(CentimeterMeasurements::scaled(px, scale, height_cm).rounded())
}

/// Zero when hips are zero; a degenerate case, not an error.
fn waist_to_hip(waist_cm: f64, hips_cm: f64) -> f64 {
    if hips_cm > 0.0 {
        waist_cm / hips_cm
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
