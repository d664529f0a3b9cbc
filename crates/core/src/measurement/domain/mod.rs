pub mod measurement_calculator;
pub mod pixel_measurements;
pub mod pixel_measurer;
pub mod proportion_estimator;
pub mod scale_converter;
