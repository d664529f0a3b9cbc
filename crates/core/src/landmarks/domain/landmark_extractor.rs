use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::body_landmarks::LandmarkSet;

/// Domain interface for single-person pose detection on a still image.
///
/// Implementations hold no per-image state, so one extractor can serve
/// concurrent requests (hence `&self` and `Sync`). Returns
/// `MeasureError::PoseNotDetected` when no complete, confident pose exists.
pub trait LandmarkExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<LandmarkSet, MeasureError>;
}
