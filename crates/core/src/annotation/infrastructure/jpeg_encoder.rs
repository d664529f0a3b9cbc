use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::shared::error::MeasureError;

/// Encode an RGB image as JPEG at `quality` (1-100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, MeasureError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(img)
        .map_err(|e| MeasureError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Write already-encoded image bytes to `path`.
pub fn write_encoded(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // Ensure parent directory exists (infrastructure concern)
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_encodes_decodable_jpeg() {
        let img = RgbImage::from_pixel(64, 48, Rgb([40, 120, 200]));
        let bytes = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 48));
        let p = decoded.get_pixel(32, 24);
        assert!((p[2] as i32 - 200).abs() < 10);
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let img = RgbImage::from_fn(128, 128, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, ((x ^ y) * 2) as u8]));
        let high = encode_jpeg(&img, 95).unwrap();
        let low = encode_jpeg(&img, 10).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");
        write_encoded(&path, b"\xFF\xD8data").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\xFF\xD8data");
    }
}
