pub mod model_resolver;
pub mod onnx_pose_extractor;
pub mod pose_model;
