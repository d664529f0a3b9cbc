//! Pose skeleton overlay for landmark diagnostics.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::annotation::domain::pose_annotator::PoseAnnotator;
use crate::landmarks::domain::body_landmarks::{BodyPoint, Landmark, LandmarkSet};
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::jpeg_encoder::encode_jpeg;

const POINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LIMB_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const POINT_RADIUS: i32 = 4;
const LIMB_THICKNESS: u32 = 2;

/// Connections between tracked points, following the COCO pose skeleton.
/// Knees are not tracked, so each leg runs straight from hip to ankle.
pub const LIMBS: [(BodyPoint, BodyPoint); 8] = [
    (BodyPoint::LeftHip, BodyPoint::LeftAnkle),
    (BodyPoint::RightHip, BodyPoint::RightAnkle),
    (BodyPoint::LeftHip, BodyPoint::RightHip),
    (BodyPoint::LeftShoulder, BodyPoint::LeftHip),
    (BodyPoint::RightShoulder, BodyPoint::RightHip),
    (BodyPoint::LeftShoulder, BodyPoint::RightShoulder),
    (BodyPoint::LeftShoulder, BodyPoint::LeftElbow),
    (BodyPoint::RightShoulder, BodyPoint::RightElbow),
];

/// Draw limbs, then keypoints on top of them.
pub fn draw_skeleton(img: &mut RgbImage, landmarks: &LandmarkSet) {
    for (from, to) in LIMBS {
        draw_limb(img, landmarks.get(from), landmarks.get(to));
    }
    for (_, point) in landmarks.iter() {
        if is_drawable(point) {
            draw_filled_circle_mut(
                img,
                (point.x.round() as i32, point.y.round() as i32),
                POINT_RADIUS,
                POINT_COLOR,
            );
        }
    }
}

fn draw_limb(img: &mut RgbImage, from: Landmark, to: Landmark) {
    if !is_drawable(from) || !is_drawable(to) {
        return;
    }
    let length = from.distance(&to);
    if length == 0.0 {
        return;
    }
    // Widen by stepping along the unit normal.
    let (nx, ny) = ((from.y - to.y) / length, (to.x - from.x) / length);
    for step in 0..LIMB_THICKNESS {
        let (ox, oy) = (nx * step as f64, ny * step as f64);
        draw_line_segment_mut(
            img,
            ((from.x + ox) as f32, (from.y + oy) as f32),
            ((to.x + ox) as f32, (to.y + oy) as f32),
            LIMB_COLOR,
        );
    }
}

fn is_drawable(point: Landmark) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

pub struct SkeletonAnnotator {
    jpeg_quality: u8,
}

impl SkeletonAnnotator {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }
}

impl PoseAnnotator for SkeletonAnnotator {
    fn annotate_pose(
        &self,
        frame: &Frame,
        landmarks: &LandmarkSet,
    ) -> Result<Vec<u8>, MeasureError> {
        let mut img = frame.to_rgb_image();
        draw_skeleton(&mut img, landmarks);
        encode_jpeg(&img, self.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);

    fn small_pose() -> LandmarkSet {
        LandmarkSet::from_fn(|bp| match bp {
            BodyPoint::Nose => Landmark::new(50.0, 10.0),
            BodyPoint::LeftShoulder => Landmark::new(30.0, 40.0),
            BodyPoint::RightShoulder => Landmark::new(70.0, 40.0),
            BodyPoint::LeftElbow => Landmark::new(20.0, 70.0),
            BodyPoint::RightElbow => Landmark::new(80.0, 70.0),
            BodyPoint::LeftHip => Landmark::new(35.0, 100.0),
            BodyPoint::RightHip => Landmark::new(65.0, 100.0),
            BodyPoint::LeftAnkle => Landmark::new(35.0, 180.0),
            BodyPoint::RightAnkle => Landmark::new(65.0, 180.0),
        })
    }

    #[test]
    fn test_limbs_connect_distinct_points() {
        for (from, to) in LIMBS {
            assert_ne!(from, to);
        }
    }

    #[test]
    fn test_draws_points_and_limbs() {
        let mut img = RgbImage::from_pixel(100, 200, BACKGROUND);
        draw_skeleton(&mut img, &small_pose());

        for (_, point) in small_pose().iter() {
            assert_eq!(*img.get_pixel(point.x as u32, point.y as u32), POINT_COLOR);
        }
        // Midpoints of the shoulder line and the left leg.
        assert_eq!(*img.get_pixel(50, 40), LIMB_COLOR);
        assert_eq!(*img.get_pixel(35, 140), LIMB_COLOR);
        assert_eq!(*img.get_pixel(95, 5), BACKGROUND);
    }

    #[test]
    fn test_points_outside_image_are_clipped() {
        let pose = LandmarkSet::from_fn(|bp| match bp {
            BodyPoint::LeftAnkle => Landmark::new(-40.0, 500.0),
            _ => small_pose().get(bp),
        });
        let mut img = RgbImage::from_pixel(100, 200, BACKGROUND);
        draw_skeleton(&mut img, &pose);
        assert_eq!(*img.get_pixel(30, 40), POINT_COLOR);
    }

    #[test]
    fn test_annotate_pose_leaves_frame_untouched() {
        let frame = Frame::new(vec![128; 100 * 200 * 3], 100, 200);
        let before = frame.data().to_vec();
        let jpeg = SkeletonAnnotator::new(90)
            .annotate_pose(&frame, &small_pose())
            .unwrap();

        assert_eq!(frame.data(), &before[..]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 200));
    }
}
