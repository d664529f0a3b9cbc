use crate::landmarks::domain::body_landmarks::LandmarkSet;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

/// Renders detected landmarks onto a copy of the photo and encodes it.
pub trait PoseAnnotator: Send + Sync {
    fn annotate_pose(
        &self,
        frame: &Frame,
        landmarks: &LandmarkSet,
    ) -> Result<Vec<u8>, MeasureError>;
}
