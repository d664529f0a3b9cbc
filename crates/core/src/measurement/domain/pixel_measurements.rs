use serde::Serialize;

/// Which formula set produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementMode {
    Landmarks,
    Proportions,
}

impl std::fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementMode::Landmarks => write!(f, "landmarks"),
            MeasurementMode::Proportions => write!(f, "proportions"),
        }
    }
}

/// Body distances in pixels, all derived from one landmark set or one
/// proportion estimate, never a mix of both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelMeasurements {
    pub shoulder_width_px: f64,
    pub chest_width_px: f64,
    pub waist_width_px: f64,
    pub hip_width_px: f64,
    pub body_height_px: f64,
    /// Shoulder line to hip line; only known in landmark mode.
    pub torso_height_px: Option<f64>,
    pub mode: MeasurementMode,
}

impl PixelMeasurements {
    pub fn widths(&self) -> [f64; 4] {
        [
            self.shoulder_width_px,
            self.chest_width_px,
            self.waist_width_px,
            self.hip_width_px,
        ]
    }

    /// Widths must be finite and non-negative to be drawn or converted.
    pub fn has_valid_widths(&self) -> bool {
        self.widths().iter().all(|w| w.is_finite() && *w >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelMeasurements {
        PixelMeasurements {
            shoulder_width_px: 400.0,
            chest_width_px: 368.0,
            waist_width_px: 306.0,
            hip_width_px: 360.0,
            body_height_px: 1925.0,
            torso_height_px: Some(600.0),
            mode: MeasurementMode::Landmarks,
        }
    }

    #[test]
    fn test_widths_order() {
        assert_eq!(sample().widths(), [400.0, 368.0, 306.0, 360.0]);
    }

    #[test]
    fn test_negative_or_nan_widths_are_invalid() {
        let mut px = sample();
        assert!(px.has_valid_widths());
        px.waist_width_px = -1.0;
        assert!(!px.has_valid_widths());
        px.waist_width_px = f64::NAN;
        assert!(!px.has_valid_widths());
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_string(&MeasurementMode::Proportions).unwrap();
        assert_eq!(json, "\"proportions\"");
    }
}
