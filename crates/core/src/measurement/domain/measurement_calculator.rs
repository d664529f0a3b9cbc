//! Landmark formula set: pixel distances from a detected pose.
//!
//! Widths the pose model cannot see directly (chest, waist) are fixed
//! fractions of the visible shoulder and hip spans. The ratios are empirical
//! constants, not fitted per image, and distances are plain 2D pixel
//! distances with no perspective correction.

use crate::landmarks::domain::body_landmarks::{BodyPoint, LandmarkSet};

use super::pixel_measurements::{MeasurementMode, PixelMeasurements};

/// Chest width as a fraction of shoulder width.
pub const CHEST_TO_SHOULDER: f64 = 0.92;

/// Waist width as a fraction of hip width.
pub const WAIST_TO_HIP: f64 = 0.85;

/// Nose-to-ankle span times this gives full height (head above the nose).
pub const HEAD_ALLOWANCE: f64 = 1.1;

pub fn measure_landmarks(landmarks: &LandmarkSet) -> PixelMeasurements {
    let l_shoulder = landmarks.get(BodyPoint::LeftShoulder);
    let r_shoulder = landmarks.get(BodyPoint::RightShoulder);
    let l_hip = landmarks.get(BodyPoint::LeftHip);
    let r_hip = landmarks.get(BodyPoint::RightHip);
    let nose = landmarks.get(BodyPoint::Nose);
    let l_ankle = landmarks.get(BodyPoint::LeftAnkle);
    let r_ankle = landmarks.get(BodyPoint::RightAnkle);

    let shoulder_width_px = l_shoulder.distance(&r_shoulder);
    let hip_width_px = l_hip.distance(&r_hip);

    let shoulder_y = (l_shoulder.y + r_shoulder.y) / 2.0;
    let hip_y = (l_hip.y + r_hip.y) / 2.0;
    let ankle_y = (l_ankle.y + r_ankle.y) / 2.0;

    PixelMeasurements {
        shoulder_width_px,
        chest_width_px: shoulder_width_px * CHEST_TO_SHOULDER,
        waist_width_px: hip_width_px * WAIST_TO_HIP,
        hip_width_px,
        body_height_px: (ankle_y - nose.y).abs() * HEAD_ALLOWANCE,
        torso_height_px: Some((hip_y - shoulder_y).abs()),
        mode: MeasurementMode::Landmarks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::domain::body_landmarks::Landmark;
    use approx::assert_relative_eq;

    fn reference_pose() -> LandmarkSet {
        LandmarkSet::from_fn(|bp| match bp {
            BodyPoint::Nose => Landmark::new(500.0, 150.0),
            BodyPoint::LeftShoulder => Landmark::new(300.0, 400.0),
            BodyPoint::RightShoulder => Landmark::new(700.0, 400.0),
            BodyPoint::LeftElbow => Landmark::new(260.0, 700.0),
            BodyPoint::RightElbow => Landmark::new(740.0, 700.0),
            BodyPoint::LeftHip => Landmark::new(320.0, 1000.0),
            BodyPoint::RightHip => Landmark::new(680.0, 1000.0),
            BodyPoint::LeftAnkle => Landmark::new(350.0, 1900.0),
            BodyPoint::RightAnkle => Landmark::new(650.0, 1900.0),
        })
    }

    #[test]
    fn test_reference_pose_widths() {
        let px = measure_landmarks(&reference_pose());
        assert_relative_eq!(px.shoulder_width_px, 400.0);
        assert_relative_eq!(px.hip_width_px, 360.0);
        assert_relative_eq!(px.chest_width_px, 368.0, epsilon = 1e-9);
        assert_relative_eq!(px.waist_width_px, 306.0, epsilon = 1e-9);
        assert_eq!(px.mode, MeasurementMode::Landmarks);
    }

    #[test]
    fn test_reference_pose_heights() {
        let px = measure_landmarks(&reference_pose());
        assert_relative_eq!(px.body_height_px, 1925.0, epsilon = 1e-9);
        assert_relative_eq!(px.torso_height_px.unwrap(), 600.0);
    }

    #[test]
    fn test_tilted_shoulders_use_euclidean_distance() {
        let base = reference_pose();
        let tilted = LandmarkSet::from_fn(|bp| match bp {
            BodyPoint::LeftShoulder => Landmark::new(0.0, 0.0),
            BodyPoint::RightShoulder => Landmark::new(30.0, 40.0),
            other => base.get(other),
        });
        assert_relative_eq!(measure_landmarks(&tilted).shoulder_width_px, 50.0);
    }

    #[test]
    fn test_elbows_do_not_affect_measurements() {
        let base = reference_pose();
        let moved = LandmarkSet::from_fn(|bp| match bp {
            BodyPoint::LeftElbow => Landmark::new(0.0, 0.0),
            BodyPoint::RightElbow => Landmark::new(999.0, 999.0),
            other => base.get(other),
        });
        assert_eq!(measure_landmarks(&base), measure_landmarks(&moved));
    }

    #[test]
    fn test_inverted_pose_still_positive_height() {
        // Upside-down photo: ankles above the nose
        let base = reference_pose();
        let flipped = LandmarkSet::from_fn(|bp| {
            let p = base.get(bp);
            Landmark::new(p.x, 2000.0 - p.y)
        });
        let px = measure_landmarks(&flipped);
        assert_relative_eq!(px.body_height_px, 1925.0, epsilon = 1e-9);
        assert_relative_eq!(px.torso_height_px.unwrap(), 600.0);
    }

    #[test]
    fn test_collapsed_pose_has_zero_height() {
        let flat = LandmarkSet::from_fn(|_| Landmark::new(10.0, 10.0));
        let px = measure_landmarks(&flat);
        assert_eq!(px.body_height_px, 0.0);
        assert_eq!(px.shoulder_width_px, 0.0);
    }
}
