pub mod landmark_measurer;
pub mod measurer_factory;
