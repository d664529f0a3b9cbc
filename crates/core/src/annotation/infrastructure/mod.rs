mod bitmap_font;
pub mod jpeg_encoder;
pub mod overlay_annotator;
pub mod skeleton_annotator;
