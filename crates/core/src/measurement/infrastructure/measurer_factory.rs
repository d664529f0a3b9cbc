use std::path::PathBuf;
use std::sync::{Arc, Once};
use std::time::Duration;

use crate::landmarks::domain::landmark_extractor::LandmarkExtractor;
use crate::landmarks::infrastructure::model_resolver::{self, ModelSource, ProgressFn};
use crate::landmarks::infrastructure::onnx_pose_extractor::OnnxPoseExtractor;
use crate::landmarks::infrastructure::pose_model::PoseModel;
use crate::measurement::domain::pixel_measurer::PixelMeasurer;
use crate::measurement::domain::proportion_estimator::ProportionEstimator;
use crate::shared::config::MeasureConfig;
use crate::shared::constants::POSE_MODEL_ENV;
use crate::shared::error::MeasureError;

use super::landmark_measurer::LandmarkMeasurer;

static MODEL_UNAVAILABLE_WARNING: Once = Once::new();

/// Creates the best available measurer, preferring landmarks when the pose
/// model can be resolved and loaded.
///
/// Call once at startup and share the result. If the model is missing or
/// fails to load, logs a single warning and returns the proportion
/// estimator; model unavailability never surfaces as a request error.
/// `progress` is reported while the model downloads, if it has to.
pub fn create_measurer(
    config: &MeasureConfig,
    progress: Option<ProgressFn>,
) -> Arc<dyn PixelMeasurer> {
    if config.force_proportions {
        log::info!("Proportion estimate forced by configuration");
        return Arc::new(ProportionEstimator);
    }

    let measurer = load_pose_model(config, progress).and_then(|model| {
        log::info!("Using pose landmarks ({})", model.path().display());
        create_landmark_measurer(onnx_extractor(model, config), config)
    });
    match measurer {
        Ok(measurer) => measurer,
        Err(e) => {
            MODEL_UNAVAILABLE_WARNING.call_once(|| {
                log::warn!("{e}; falling back to proportion estimates");
            });
            Arc::new(ProportionEstimator)
        }
    }
}

/// Wrap an extractor with the configured timeout and fallback policy.
pub fn create_landmark_measurer(
    extractor: Arc<dyn LandmarkExtractor>,
    config: &MeasureConfig,
) -> Result<Arc<dyn PixelMeasurer>, MeasureError> {
    Ok(Arc::new(LandmarkMeasurer::new(
        extractor,
        Duration::from_millis(config.detection_timeout_ms),
        config.strict_landmarks,
    )?))
}

/// A strict, timeout-bounded pose extractor for landmark diagnostics.
///
/// The result serves as both [`LandmarkExtractor`] and [`PixelMeasurer`].
/// Unlike [`create_measurer`] there is nothing to fall back to, so a
/// missing model is returned as `ModelUnavailable`.
pub fn create_pose_extractor(
    config: &MeasureConfig,
    progress: Option<ProgressFn>,
) -> Result<Arc<LandmarkMeasurer>, MeasureError> {
    let model = load_pose_model(config, progress)?;
    log::info!("Using pose landmarks ({})", model.path().display());
    Ok(Arc::new(LandmarkMeasurer::new(
        onnx_extractor(model, config),
        Duration::from_millis(config.detection_timeout_ms),
        true,
    )?))
}

fn onnx_extractor(model: Arc<PoseModel>, config: &MeasureConfig) -> Arc<dyn LandmarkExtractor> {
    Arc::new(OnnxPoseExtractor::new(
        model,
        config.min_detection_confidence,
        config.min_keypoint_confidence,
    ))
}

fn load_pose_model(
    config: &MeasureConfig,
    progress: Option<ProgressFn>,
) -> Result<Arc<PoseModel>, MeasureError> {
    let env_path = std::env::var_os(POSE_MODEL_ENV).map(PathBuf::from);
    let explicit = config.model_path.as_deref().or(env_path.as_deref());
    let bundled = bundled_models_dir();
    let source = ModelSource {
        explicit,
        bundled_dir: bundled.as_deref(),
        url: config.model_url.as_deref(),
    };

    let path = model_resolver::resolve(&config.model_name, &source, progress)
        .map_err(|e| MeasureError::ModelUnavailable(e.to_string()))?;

    let model = PoseModel::shared(path);
    model.ensure_loaded()?;
    Ok(model)
}

/// `models/` next to the running executable, for packaged installs.
fn bundled_models_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("models"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::domain::body_landmarks::LandmarkSet;
    use crate::measurement::domain::pixel_measurements::MeasurementMode;
    use crate::shared::frame::Frame;

    struct NoPoseExtractor;

    impl LandmarkExtractor for NoPoseExtractor {
        fn extract(&self, _frame: &Frame) -> Result<LandmarkSet, MeasureError> {
            Err(MeasureError::PoseNotDetected)
        }
    }

    #[test]
    fn test_forced_proportions() {
        let config = MeasureConfig {
            force_proportions: true,
            ..MeasureConfig::default()
        };
        assert_eq!(create_measurer(&config, None).mode(), MeasurementMode::Proportions);
    }

    #[test]
    fn test_missing_model_degrades_to_proportions() {
        let config = MeasureConfig {
            model_path: Some(PathBuf::from("/nonexistent/pose.onnx")),
            ..MeasureConfig::default()
        };
        assert_eq!(create_measurer(&config, None).mode(), MeasurementMode::Proportions);
    }

    #[test]
    fn test_corrupt_model_degrades_to_proportions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.onnx");
        std::fs::write(&path, b"garbage").unwrap();
        let config = MeasureConfig {
            model_path: Some(path),
            ..MeasureConfig::default()
        };
        assert_eq!(create_measurer(&config, None).mode(), MeasurementMode::Proportions);
    }

    #[test]
    fn test_pose_extractor_requires_model() {
        let config = MeasureConfig {
            model_path: Some(PathBuf::from("/nonexistent/pose.onnx")),
            ..MeasureConfig::default()
        };
        assert!(matches!(
            create_pose_extractor(&config, None),
            Err(MeasureError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_landmark_measurer_uses_configured_policy() {
        let config = MeasureConfig {
            strict_landmarks: false,
            ..MeasureConfig::default()
        };
        let measurer = create_landmark_measurer(Arc::new(NoPoseExtractor), &config).unwrap();
        let frame = Frame::new(vec![0; 800 * 1000 * 3], 800, 1000);
        assert_eq!(
            measurer.measure(&frame).unwrap().mode,
            MeasurementMode::Proportions
        );
    }
}
