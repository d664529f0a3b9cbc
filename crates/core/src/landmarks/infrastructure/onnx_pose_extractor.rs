//! YOLO-pose landmark extractor using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, NMS post-processing and the
//! mapping of COCO keypoints onto a [`LandmarkSet`]. Runs in still-image
//! mode: no tracking state survives between calls.

use std::sync::Arc;

use crate::landmarks::domain::body_landmarks::{BodyPoint, Landmark, LandmarkSet};
use crate::landmarks::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::error::MeasureError;
use crate::shared::frame::Frame;

use super::pose_model::PoseModel;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// COCO pose layout: 17 keypoints × (x, y, conf).
const NUM_KEYPOINTS: usize = 17;

/// Box (4) + person score (1) + keypoints.
const NUM_FEATURES: usize = 5 + NUM_KEYPOINTS * 3;

pub struct OnnxPoseExtractor {
    model: Arc<PoseModel>,
    min_detection_confidence: f64,
    min_keypoint_confidence: f64,
}

impl OnnxPoseExtractor {
    pub fn new(
        model: Arc<PoseModel>,
        min_detection_confidence: f64,
        min_keypoint_confidence: f64,
    ) -> Self {
        Self {
            model,
            min_detection_confidence,
            min_keypoint_confidence,
        }
    }
}

impl LandmarkExtractor for OnnxPoseExtractor {
    fn extract(&self, frame: &Frame) -> Result<LandmarkSet, MeasureError> {
        let loaded = self.model.ensure_loaded()?;
        let letterbox = letterbox(frame, loaded.input_size);

        let (shape, data) = {
            let mut session = loaded.session();
            let input = ort::value::Tensor::from_array(letterbox.tensor)
                .map_err(|e| MeasureError::Inference(e.to_string()))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| MeasureError::Inference(e.to_string()))?;
            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| MeasureError::Inference(e.to_string()))?;
            let shape = tensor.shape().to_vec();
            let data = tensor.iter().copied().collect::<Vec<f32>>();
            (shape, data)
        };

        let mut people = parse_detections(
            &data,
            &shape,
            self.min_detection_confidence,
            &letterbox.mapping,
        )?;
        let kept = nms(&mut people, NMS_IOU_THRESH);
        log::debug!("Pose model returned {} person candidate(s)", kept.len());

        let best = kept.first().ok_or(MeasureError::PoseNotDetected)?;
        to_landmark_set(
            best,
            frame.width(),
            frame.height(),
            self.min_keypoint_confidence,
        )
        .ok_or(MeasureError::PoseNotDetected)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Maps letterboxed model coordinates back onto the source frame.
#[derive(Clone, Copy, Debug)]
struct LetterboxMapping {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl LetterboxMapping {
    fn unmap(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    mapping: LetterboxMapping,
}

/// Letterbox-resize a frame to `target_size` × `target_size` as NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114/255 gray padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        mapping: LetterboxMapping {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct PersonDetection {
    bbox: [f64; 4],
    confidence: f64,
    /// Source-frame pixel coordinates plus confidence, COCO order.
    keypoints: [(f64, f64, f64); NUM_KEYPOINTS],
}

/// Decode raw YOLO-pose output into person detections in frame coordinates.
///
/// Output shape is `[1, features, detections]` (transposed, the usual export)
/// or `[1, detections, features]`.
fn parse_detections(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
    mapping: &LetterboxMapping,
) -> Result<Vec<PersonDetection>, MeasureError> {
    if shape.len() != 3 {
        return Err(MeasureError::Inference(format!(
            "unexpected pose output shape: {shape:?}"
        )));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < NUM_FEATURES {
        return Err(MeasureError::Inference(format!(
            "pose output has {num_feats} features per detection, expected {NUM_FEATURES}"
        )));
    }
    if data.len() < num_dets * num_feats {
        return Err(MeasureError::Inference("pose output is truncated".into()));
    }

    let at = |det: usize, feat: usize| -> f64 {
        if transposed {
            data[feat * num_dets + det] as f64
        } else {
            data[det * num_feats + feat] as f64
        }
    };

    let mut people = Vec::new();
    for i in 0..num_dets {
        let conf = at(i, 4);
        if conf < min_confidence {
            continue;
        }

        let (cx, cy, w, h) = (at(i, 0), at(i, 1), at(i, 2), at(i, 3));
        let (x1, y1) = mapping.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = mapping.unmap(cx + w / 2.0, cy + h / 2.0);

        let mut keypoints = [(0.0, 0.0, 0.0); NUM_KEYPOINTS];
        for (k, kp) in keypoints.iter_mut().enumerate() {
            let base = 5 + k * 3;
            let (kx, ky) = mapping.unmap(at(i, base), at(i, base + 1));
            *kp = (kx, ky, at(i, base + 2));
        }

        people.push(PersonDetection {
            bbox: [x1, y1, x2, y2],
            confidence: conf,
            keypoints,
        });
    }
    Ok(people)
}

/// Keep a detection's landmarks only if every required keypoint is confident.
///
/// Coordinates are normalized against the frame, clamped into it, and mapped
/// back to pixels.
fn to_landmark_set(
    person: &PersonDetection,
    width: u32,
    height: u32,
    min_keypoint_confidence: f64,
) -> Option<LandmarkSet> {
    LandmarkSet::try_from_fn(|bp: BodyPoint| {
        let (x, y, conf) = person.keypoints[bp.coco_index()];
        if conf < min_keypoint_confidence {
            return None;
        }
        let nx = (x / width as f64).clamp(0.0, 1.0);
        let ny = (y / height as f64).clamp(0.0, 1.0);
        Some(Landmark::from_normalized(nx, ny, width, height))
    })
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [PersonDetection], iou_thresh: f64) -> Vec<PersonDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<PersonDetection> = Vec::new();
    for det in dets.iter() {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &det.bbox) <= iou_thresh) {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
