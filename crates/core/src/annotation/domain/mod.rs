pub mod measurement_annotator;
pub mod pose_annotator;
