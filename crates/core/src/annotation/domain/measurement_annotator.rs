use crate::measurement::domain::pixel_measurements::PixelMeasurements;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

/// Domain interface for rendering measurements onto a photo.
///
/// Implementations draw on a copy and return the encoded result; the
/// source frame is never modified.
pub trait MeasurementAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &Frame,
        measurements: &PixelMeasurements,
    ) -> Result<Vec<u8>, MeasureError>;
}
