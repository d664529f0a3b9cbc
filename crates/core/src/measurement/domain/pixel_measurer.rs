use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::pixel_measurements::{MeasurementMode, PixelMeasurements};

/// Domain interface for turning a photo into pixel measurements.
///
/// One implementation per formula set; the active one is picked once at
/// startup by capability detection and shared by every request.
pub trait PixelMeasurer: Send + Sync {
    /// Formula set this measurer is configured for.
    fn mode(&self) -> MeasurementMode;

    fn measure(&self, frame: &Frame) -> Result<PixelMeasurements, MeasureError>;
}
