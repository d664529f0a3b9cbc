pub mod measure_body_use_case;
pub mod measurement_api;
