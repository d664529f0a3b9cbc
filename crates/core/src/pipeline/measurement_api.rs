//! Wire types for one measurement request and its response.
//!
//! Images travel as base64 strings, optionally in `data:` URL form.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::measurement::domain::pixel_measurements::PixelMeasurements;
use crate::measurement::domain::scale_converter::CentimeterMeasurements;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::measure_body_use_case::{BodyMeasurement, PoseAnalysis};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRequest {
    /// Frontal full-body photo.
    pub image_base64: String,
    /// Accepted for compatibility; never decoded or used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_image_base64: Option<String>,
    /// Missing is treated the same as invalid.
    #[serde(default)]
    pub height_cm: Option<f64>,
}

impl MeasurementRequest {
    pub fn new(image_base64: String, height_cm: f64) -> Self {
        Self {
            image_base64,
            side_image_base64: None,
            height_cm: Some(height_cm),
        }
    }

    /// The supplied height, or `InvalidUserHeight` if absent.
    pub fn height(&self) -> Result<f64, MeasureError> {
        self.height_cm.ok_or(MeasureError::InvalidUserHeight(f64::NAN))
    }

    /// Decode the frontal image. A side image only gets logged, so a
    /// broken one cannot fail the request.
    pub fn decode_images(&self) -> Result<Frame, MeasureError> {
        let frame = decode_image(&self.image_base64)?;
        if let Some(side) = &self.side_image_base64 {
            log::debug!("Side image ({} base64 chars) ignored", side.len());
        }
        Ok(frame)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResponse {
    pub shoulders_cm: f64,
    pub bust_cm: f64,
    pub waist_cm: f64,
    pub hips_cm: f64,
    pub waist_to_hip_ratio: f64,
    pub height_cm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torso_height_cm: Option<f64>,
    pub mode: String,
    /// Base64 JPEG.
    pub annotated_image: String,

    pub shoulder_width_px: f64,
    pub chest_width_px: f64,
    pub waist_width_px: f64,
    pub hip_width_px: f64,
    pub body_height_px: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torso_height_px: Option<f64>,
}

impl From<&BodyMeasurement> for MeasurementResponse {
    fn from(m: &BodyMeasurement) -> Self {
        let cm = &m.centimeters;
        let px = &m.pixels;
        Self {
            shoulders_cm: cm.shoulders_cm,
            bust_cm: cm.bust_cm,
            waist_cm: cm.waist_cm,
            hips_cm: cm.hips_cm,
            waist_to_hip_ratio: cm.waist_to_hip_ratio,
            height_cm: cm.height_cm,
            torso_height_cm: cm.torso_height_cm,
            mode: px.mode.to_string(),
            annotated_image: STANDARD.encode(&m.annotated_jpeg),
            shoulder_width_px: px.shoulder_width_px,
            chest_width_px: px.chest_width_px,
            waist_width_px: px.waist_width_px,
            hip_width_px: px.hip_width_px,
            body_height_px: px.body_height_px,
            torso_height_px: px.torso_height_px,
        }
    }
}

impl MeasurementResponse {
    /// Decoded bytes of the annotated JPEG.
    pub fn annotated_jpeg(&self) -> Result<Vec<u8>, MeasureError> {
        STANDARD
            .decode(self.annotated_image.as_bytes())
            .map_err(|e| MeasureError::Encode(e.to_string()))
    }
}

/// One detected keypoint in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkPosition {
    pub point: &'static str,
    pub x: f64,
    pub y: f64,
}

/// Diagnostics output: the skeleton overlay plus both measurement sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseAnalysisResponse {
    /// Base64 JPEG with the skeleton drawn on.
    pub annotated_image: String,
    pub landmarks: Vec<LandmarkPosition>,
    pub measurements_px: PixelMeasurements,
    pub measurements_cm: CentimeterMeasurements,
}

impl From<&PoseAnalysis> for PoseAnalysisResponse {
    fn from(a: &PoseAnalysis) -> Self {
        Self {
            annotated_image: STANDARD.encode(&a.annotated_jpeg),
            landmarks: a
                .landmarks
                .iter()
                .map(|(bp, lm)| LandmarkPosition {
                    point: bp.name(),
                    x: lm.x,
                    y: lm.y,
                })
                .collect(),
            measurements_px: a.pixels.clone(),
            measurements_cm: a.centimeters.clone(),
        }
    }
}

impl PoseAnalysisResponse {
    pub fn annotated_jpeg(&self) -> Result<Vec<u8>, MeasureError> {
        STANDARD
            .decode(self.annotated_image.as_bytes())
            .map_err(|e| MeasureError::Encode(e.to_string()))
    }
}

/// Drop a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, payload)| payload),
        None => trimmed,
    }
}

/// Base64 (optionally `data:` URL) to decoded RGB frame.
pub fn decode_image(encoded: &str) -> Result<Frame, MeasureError> {
    let payload = strip_data_url(encoded);
    if payload.is_empty() {
        return Err(MeasureError::InvalidImage("empty image payload".into()));
    }
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| MeasureError::InvalidImage(format!("bad base64: {e}")))?;
    Frame::decode(&bytes)
}

/// Base64 of raw file bytes, for building requests from disk.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rstest::rstest;

    fn png_base64(w: u32, h: u32) -> String {
        let img = RgbImage::from_pixel(w, h, Rgb([10, 20, 30]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        encode_bytes(buf.get_ref())
    }

    #[rstest]
    #[case("data:image/jpeg;base64,QUJD", "QUJD")]
    #[case("  QUJD\n", "QUJD")]
    #[case("QUJD", "QUJD")]
    fn test_strip_data_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_data_url(input), expected);
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        let b64 = png_base64(12, 7);
        let frame = decode_image(&b64).unwrap();
        assert_eq!((frame.width(), frame.height()), (12, 7));

        let url = format!("data:image/png;base64,{b64}");
        assert_eq!(decode_image(&url).unwrap().width(), 12);
    }

    #[rstest]
    #[case("")]
    #[case("data:image/png;base64,")]
    #[case("not base64 !!")]
    #[case("QUJD")]
    fn test_bad_payload_is_invalid_image(#[case] input: &str) {
        assert!(matches!(
            decode_image(input),
            Err(MeasureError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_corrupt_side_image_is_ignored() {
        let request = MeasurementRequest {
            image_base64: png_base64(4, 4),
            side_image_base64: Some("QUJD".into()),
            height_cm: Some(170.0),
        };
        let frame = request.decode_images().unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 4));
    }

    #[test]
    fn test_missing_height_is_invalid() {
        let request: MeasurementRequest =
            serde_json::from_str(r#"{"image_base64": "QUJD"}"#).unwrap();
        assert!(matches!(
            request.height(),
            Err(MeasureError::InvalidUserHeight(_))
        ));
    }

    #[test]
    fn test_request_json_shape() {
        let request: MeasurementRequest = serde_json::from_str(
            r#"{"image_base64": "QUJD", "side_image_base64": "REVG", "height_cm": 165.5}"#,
        )
        .unwrap();
        assert_eq!(request.height().unwrap(), 165.5);
        assert_eq!(request.side_image_base64.as_deref(), Some("REVG"));
    }
}
