pub mod body_landmarks;
pub mod landmark_extractor;
