use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use crate::annotation::domain::measurement_annotator::MeasurementAnnotator;
use crate::measurement::domain::pixel_measurements::PixelMeasurements;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::bitmap_font;
use super::jpeg_encoder::encode_jpeg;

const LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_BG: Rgb<u8> = Rgb([0, 0, 0]);

const LINE_THICKNESS: u32 = 3;
const MARKER_RADIUS: i32 = 8;
const LABEL_GAP: i32 = 10;
const LABEL_PAD: i32 = 5;
const FONT_SCALE: u32 = 2;

/// Fixed vertical positions of the guide lines, as fractions of image height.
const GUIDES: [(&str, f64); 4] = [
    ("Shoulders", 0.15),
    ("Bust", 0.25),
    ("Waist", 0.45),
    ("Hips", 0.60),
];

/// One horizontal measurement line, centered on the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideLine {
    pub label: &'static str,
    pub y: i32,
    pub left: i32,
    pub right: i32,
}

/// Lay out the four guide lines for an image of `width` x `height`.
///
/// Lines are centered horizontally regardless of where the body actually
/// is. Widths larger than twice the image are capped; the overflow would be
/// clipped anyway.
pub fn guide_lines(width: u32, height: u32, px: &PixelMeasurements) -> [GuideLine; 4] {
    let center_x = (width / 2) as i32;
    let widths = px.widths();
    std::array::from_fn(|i| {
        let (label, fraction) = GUIDES[i];
        let half = (widths[i] / 2.0).min(width as f64) as i32;
        GuideLine {
            label,
            y: (height as f64 * fraction) as i32,
            left: center_x - half,
            right: center_x + half,
        }
    })
}

/// Draws guide lines, endpoint markers and labels, then encodes as JPEG.
pub struct OverlayAnnotator {
    jpeg_quality: u8,
}

impl OverlayAnnotator {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn draw(img: &mut RgbImage, line: &GuideLine) {
        let half_t = (LINE_THICKNESS / 2) as i32;
        let len = (line.right - line.left + 1) as u32;
        draw_filled_rect_mut(
            img,
            Rect::at(line.left, line.y - half_t).of_size(len, LINE_THICKNESS),
            LINE_COLOR,
        );

        for x in [line.left, line.right] {
            for r in [MARKER_RADIUS + 2, MARKER_RADIUS + 3] {
                draw_hollow_circle_mut(img, (x, line.y), r, OUTLINE_COLOR);
            }
            draw_filled_circle_mut(img, (x, line.y), MARKER_RADIUS, LINE_COLOR);
        }

        let (tw, th) = bitmap_font::text_size(line.label, FONT_SCALE);
        let tx = line.right + LABEL_GAP;
        let ty = line.y - th as i32;
        draw_filled_rect_mut(
            img,
            Rect::at(tx - LABEL_PAD, ty - LABEL_PAD)
                .of_size(tw + 2 * LABEL_PAD as u32, th + 2 * LABEL_PAD as u32),
            LABEL_BG,
        );
        bitmap_font::draw_text(img, line.label, tx, ty, FONT_SCALE, LINE_COLOR);
    }
}

impl MeasurementAnnotator for OverlayAnnotator {
    fn annotate(
        &self,
        frame: &Frame,
        measurements: &PixelMeasurements,
    ) -> Result<Vec<u8>, MeasureError> {
        if !measurements.has_valid_widths() {
            return Err(MeasureError::InvalidMeasurements(format!(
                "widths must be finite and non-negative, got {:?}",
                measurements.widths()
            )));
        }

        let mut img = frame.to_rgb_image();
        for line in guide_lines(frame.width(), frame.height(), measurements) {
            Self::draw(&mut img, &line);
        }
        encode_jpeg(&img, self.jpeg_quality)
    }
}
