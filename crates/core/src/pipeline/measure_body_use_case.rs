use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::annotation::domain::measurement_annotator::MeasurementAnnotator;
use crate::annotation::domain::pose_annotator::PoseAnnotator;
use crate::landmarks::domain::body_landmarks::LandmarkSet;
use crate::landmarks::domain::landmark_extractor::LandmarkExtractor;
use crate::measurement::domain::measurement_calculator::measure_landmarks;
use crate::measurement::domain::pixel_measurements::PixelMeasurements;
use crate::measurement::domain::pixel_measurer::PixelMeasurer;
use crate::measurement::domain::scale_converter::{self, validate_user_height, CentimeterMeasurements};
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::measurement_api::{MeasurementRequest, MeasurementResponse, PoseAnalysisResponse};

/// Everything one request produces.
#[derive(Debug, Clone)]
pub struct BodyMeasurement {
    pub pixels: PixelMeasurements,
    pub centimeters: CentimeterMeasurements,
    pub annotated_jpeg: Vec<u8>,
}

/// Landmark diagnostics: the detected pose drawn as a skeleton, with the
/// measurements derived from it.
#[derive(Debug, Clone)]
pub struct PoseAnalysis {
    pub landmarks: LandmarkSet,
    pub pixels: PixelMeasurements,
    pub centimeters: CentimeterMeasurements,
    pub annotated_jpeg: Vec<u8>,
}

struct PoseAnalyzer {
    extractor: Arc<dyn LandmarkExtractor>,
    annotator: Box<dyn PoseAnnotator>,
}

/// Single-photo measurement pipeline: measure → (convert ‖ annotate).
///
/// Holds no per-request state, so one instance can serve concurrent
/// requests.
pub struct MeasureBodyUseCase {
    measurer: Arc<dyn PixelMeasurer>,
    annotator: Box<dyn MeasurementAnnotator>,
    pose: Option<PoseAnalyzer>,
}

impl MeasureBodyUseCase {
    pub fn new(measurer: Arc<dyn PixelMeasurer>, annotator: Box<dyn MeasurementAnnotator>) -> Self {
        Self {
            measurer,
            annotator,
            pose: None,
        }
    }

    /// Enable [`MeasureBodyUseCase::analyze`].
    pub fn with_pose_analysis(
        mut self,
        extractor: Arc<dyn LandmarkExtractor>,
        annotator: Box<dyn PoseAnnotator>,
    ) -> Self {
        self.pose = Some(PoseAnalyzer {
            extractor,
            annotator,
        });
        self
    }

    /// Measures `frame` for a person `height_cm` tall.
    ///
    /// The height is checked before any detection runs. Conversion and
    /// annotation both depend only on the pixel measurements and run in
    /// parallel.
    pub fn execute(&self, frame: &Frame, height_cm: f64) -> Result<BodyMeasurement, MeasureError> {
        validate_user_height(height_cm)?;

        let start = Instant::now();
        let pixels = self.measurer.measure(frame)?;
        let measure_ms = start.elapsed().as_secs_f64() * 1000.0;

        let (centimeters, annotated) = thread::scope(|s| {
            let annotation = s.spawn(|| self.annotator.annotate(frame, &pixels));
            let centimeters = scale_converter::convert(&pixels, height_cm);
            let annotated = annotation
                .join()
                .unwrap_or_else(|_| Err(MeasureError::Encode("annotator panicked".into())));
            (centimeters, annotated)
        });
        let centimeters = centimeters?;
        let annotated_jpeg = annotated?;

        log::debug!(
            "Timing: measure {:.1}ms, total {:.1}ms",
            measure_ms,
            start.elapsed().as_secs_f64() * 1000.0
        );
        log::info!(
            "Measured {}x{} image ({}): shoulders {} cm, waist {} cm, hips {} cm",
            frame.width(),
            frame.height(),
            pixels.mode,
            centimeters.shoulders_cm,
            centimeters.waist_cm,
            centimeters.hips_cm,
        );

        Ok(BodyMeasurement {
            pixels,
            centimeters,
            annotated_jpeg,
        })
    }

    /// Detect the pose, draw its skeleton and measure from the same
    /// landmarks.
    ///
    /// Never falls back to proportions: no pose is `PoseNotDetected`, and
    /// a use case built without pose analysis reports `ModelUnavailable`.
    pub fn analyze(&self, frame: &Frame, height_cm: f64) -> Result<PoseAnalysis, MeasureError> {
        validate_user_height(height_cm)?;
        let pose = self.pose.as_ref().ok_or_else(|| {
            MeasureError::ModelUnavailable("pose analysis needs the pose model".into())
        })?;

        let start = Instant::now();
        let landmarks = pose.extractor.extract(frame)?;
        let pixels = measure_landmarks(&landmarks);

        let (centimeters, annotated) = thread::scope(|s| {
            let annotation = s.spawn(|| pose.annotator.annotate_pose(frame, &landmarks));
            let centimeters = scale_converter::convert(&pixels, height_cm);
            let annotated = annotation
                .join()
                .unwrap_or_else(|_| Err(MeasureError::Encode("pose annotator panicked".into())));
            (centimeters, annotated)
        });
        let centimeters = centimeters?;
        let annotated_jpeg = annotated?;

        log::info!(
            "Analyzed pose in {}x{} image in {:.1}ms",
            frame.width(),
            frame.height(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(PoseAnalysis {
            landmarks,
            pixels,
            centimeters,
            annotated_jpeg,
        })
    }

    /// Request boundary: validate height, decode images, measure, encode.
    pub fn handle(&self, request: &MeasurementRequest) -> Result<MeasurementResponse, MeasureError> {
        let height_cm = request.height()?;
        validate_user_height(height_cm)?;
        let frame = request.decode_images()?;
        let measurement = self.execute(&frame, height_cm)?;
        Ok(MeasurementResponse::from(&measurement))
    }

    /// Request boundary for [`MeasureBodyUseCase::analyze`].
    pub fn handle_analysis(
        &self,
        request: &MeasurementRequest,
    ) -> Result<PoseAnalysisResponse, MeasureError> {
        let height_cm = request.height()?;
        validate_user_height(height_cm)?;
        let frame = request.decode_images()?;
        let analysis = self.analyze(&frame, height_cm)?;
        Ok(PoseAnalysisResponse::from(&analysis))
    }
}
