/// Default pose model file: the largest YOLO-pose export, trading speed for
/// keypoint accuracy.
pub const POSE_MODEL_NAME: &str = "yolov8x-pose.onnx";

/// Environment variable naming an explicit pose model file.
pub const POSE_MODEL_ENV: &str = "BODYMEASURE_POSE_MODEL";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Decimal places for centimeter outputs.
pub const CM_DECIMALS: i32 = 1;

/// Decimal places for the waist-to-hip ratio.
pub const RATIO_DECIMALS: i32 = 3;
