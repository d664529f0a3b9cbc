//! Body-measurement estimation from a single full-body photo.
//!
//! A pose model locates body landmarks (or, without one, fixed proportions
//! stand in), pixel distances are scaled by the person's known height, and
//! the measurements are drawn onto a copy of the photo.

pub mod annotation;
pub mod landmarks;
pub mod measurement;
pub mod pipeline;
pub mod shared;
