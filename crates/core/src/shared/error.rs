use thiserror::Error;

/// Every failure a single measurement request can end in.
///
/// None of these are fatal to the process; each is scoped to one request.
#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("could not detect a body pose; retake the photo and make sure your full body is visible")]
    PoseNotDetected,

    #[error("could not determine body height from image (measured {body_height_px} px)")]
    InvalidBodyHeight { body_height_px: f64 },

    #[error("height must be a positive number of centimeters, got {0}")]
    InvalidUserHeight(f64),

    #[error("pose model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("pose inference failed: {0}")]
    Inference(String),

    #[error("pose detection did not finish within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("measurements cannot be drawn: {0}")]
    InvalidMeasurements(String),

    #[error("failed to encode annotated image: {0}")]
    Encode(String),
}

impl MeasureError {
    /// True for outcomes the caller can correct (bad input, retake photo).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MeasureError::InvalidImage(_)
                | MeasureError::PoseNotDetected
                | MeasureError::InvalidBodyHeight { .. }
                | MeasureError::InvalidUserHeight(_)
                | MeasureError::Timeout { .. }
        )
    }
}
