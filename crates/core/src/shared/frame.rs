use std::sync::Arc;

use ndarray::ArrayView3;

use super::error::MeasureError;

/// A decoded photo: contiguous RGB bytes in row-major order.
///
/// Frames are never mutated once decoded; drawing happens on a copy
/// produced by [`Frame::to_rgb_image`]. The pixel buffer is shared, so
/// cloning a frame to hand it to another thread does not copy pixels.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
}

const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data: data.into(),
            width,
            height,
        }
    }

    /// Decode an encoded image (JPEG, PNG, ...) into an RGB frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, MeasureError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| MeasureError::InvalidImage(e.to_string()))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(MeasureError::InvalidImage("image has no pixels".into()));
        }
        Ok(Self::new(img.into_raw(), width, height))
    }

    /// Copy the pixels into an owned `RgbImage` for drawing.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_raw(self.width, self.height, self.data.to_vec())
            .expect("Frame data length must match dimensions")
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data[..],
        )
        .expect("Frame data length must match dimensions")
    }
}
