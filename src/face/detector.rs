//! SCRFD face detector
//!
//! Runs the SCRFD (Sample and Computation Redistribution for Efficient Face
//! Detection) ONNX model with 3-stride anchor-free decoding and NMS.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;

use crate::config::DETECTOR_INPUT_SIZE;
use crate::logger;
use crate::types::FaceBox;

const CONFIDENCE_THRESHOLD: f32 = 0.5;
const NMS_THRESHOLD: f32 = 0.4;
const STRIDES: [usize; 3] = [8, 16, 32];
const ANCHORS_PER_CELL: usize = 2;
const MEAN: f32 = 127.5;
const STD: f32 = 128.0;

/// Scale metadata for mapping detections back to original image coordinates.
struct Letterbox {
    scale: f32,
    orig_w: f32,
    orig_h: f32,
}

pub struct FaceDetector {
    session: Session,
    input_name: String,
}

impl FaceDetector {
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!(
                "Detector model not found: {} — download scrfd_500m_bnkps.onnx from insightface",
                model_path.display()
            );
        }

        let session = super::create_session(model_path).context("Failed to load face detector")?;
        let input_name = session.inputs()[0].name().to_string();
        logger::debug(&format!("SCRFD loaded, input tensor: {}", input_name));

        Ok(Self { session, input_name })
    }

    /// Detect faces, returning boxes in original-image coordinates sorted by
    /// confidence (highest first).
    pub fn detect(&mut self, image: &DynamicImage) -> Result<Vec<FaceBox>> {
        let (shape, data, letterbox) = preprocess(image);
        let input = Value::from_array((shape, data)).context("Failed to build detector input")?;

        let input_name = self.input_name.clone();
        let outputs = self
            .session
            .run(ort::inputs![input_name => input])
            .context("SCRFD inference failed")?;

        let mut detections = Vec::new();

        // SCRFD exports either named outputs ("score_8", "bbox_8", ...) or
        // generic numeric names in the standard positional order
        // [scores 8/16/32, bboxes 8/16/32, kps 8/16/32].
        for (pos, &stride) in STRIDES.iter().enumerate() {
            let score_name = format!("score_{}", stride);
            let bbox_name = format!("bbox_{}", stride);

            let score_out = outputs.get(&score_name).unwrap_or_else(|| &outputs[pos]);
            let bbox_out = outputs.get(&bbox_name).unwrap_or_else(|| &outputs[pos + 3]);

            let (_, scores) = score_out
                .try_extract_tensor::<f32>()
                .with_context(|| format!("Bad score tensor at stride {}", stride))?;
            let (_, bboxes) = bbox_out
                .try_extract_tensor::<f32>()
                .with_context(|| format!("Bad bbox tensor at stride {}", stride))?;

            detections.extend(decode_stride(
                scores,
                bboxes,
                stride,
                DETECTOR_INPUT_SIZE as usize,
                &letterbox,
                CONFIDENCE_THRESHOLD,
            ));
        }

        let mut result = nms(detections, NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(result)
    }
}

/// Resize (preserving aspect ratio) into the top-left of a 640×640 canvas,
/// then convert to a normalized BGR NCHW tensor.
fn preprocess(image: &DynamicImage) -> (Vec<usize>, Vec<f32>, Letterbox) {
    let size = DETECTOR_INPUT_SIZE;
    let (ow, oh) = (image.width() as f32, image.height() as f32);
    let scale = size as f32 / ow.max(oh);

    let nw = ((ow * scale).round() as u32).clamp(1, size);
    let nh = ((oh * scale).round() as u32).clamp(1, size);
    let resized = image.resize_exact(nw, nh, FilterType::Triangle);

    let mut padded = image::RgbImage::new(size, size);
    image::imageops::overlay(&mut padded, &resized.to_rgb8(), 0, 0);

    let dim = size as usize;
    let shape = vec![1, 3, dim, dim];
    let mut data = Vec::with_capacity(3 * dim * dim);

    // InsightFace detection models expect BGR channel order
    for c in [2usize, 1, 0] {
        for y in 0..size {
            for x in 0..size {
                let px = padded.get_pixel(x, y);
                data.push((px[c] as f32 - MEAN) / STD);
            }
        }
    }

    (shape, data, Letterbox { scale, orig_w: ow, orig_h: oh })
}

/// Decode the anchor-free outputs for one stride level.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    stride: usize,
    input_size: usize,
    letterbox: &Letterbox,
    threshold: f32,
) -> Vec<FaceBox> {
    let grid = input_size / stride;
    let num_anchors = grid * grid * ANCHORS_PER_CELL;

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let cell = idx / ANCHORS_PER_CELL;
        let anchor_cx = (cell % grid) as f32 * stride as f32;
        let anchor_cy = (cell / grid) as f32 * stride as f32;

        // bbox = [left, top, right, bottom] offsets in stride units
        let b = idx * 4;
        if b + 3 >= bboxes.len() {
            continue;
        }
        let x1 = anchor_cx - bboxes[b] * stride as f32;
        let y1 = anchor_cy - bboxes[b + 1] * stride as f32;
        let x2 = anchor_cx + bboxes[b + 2] * stride as f32;
        let y2 = anchor_cy + bboxes[b + 3] * stride as f32;

        detections.push(FaceBox {
            x1: (x1 / letterbox.scale).clamp(0.0, letterbox.orig_w),
            y1: (y1 / letterbox.scale).clamp(0.0, letterbox.orig_h),
            x2: (x2 / letterbox.scale).clamp(0.0, letterbox.orig_w),
            y2: (y2 / letterbox.scale).clamp(0.0, letterbox.orig_h),
            confidence: score,
        });
    }

    detections
}

/// Non-Maximum Suppression: drop boxes overlapping a higher-confidence box.
fn nms(mut detections: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in detections {
        if keep.iter().all(|k| iou(k, &candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(x1: f32, y1: f32, x2: f32, y2: f32, conf: f32) -> FaceBox {
        FaceBox { x1, y1, x2, y2, confidence: conf }
    }

    #[test]
    fn iou_identical_boxes() {
        let a = make_box(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_disjoint_boxes() {
        let a = make_box(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_box(20.0, 20.0, 30.0, 30.0, 1.0);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn iou_half_overlap() {
        let a = make_box(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_box(5.0, 0.0, 15.0, 10.0, 1.0);
        // intersection 50, union 150
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn nms_suppresses_overlapping_keeps_distant() {
        let detections = vec![
            make_box(0.0, 0.0, 100.0, 100.0, 0.9),
            make_box(5.0, 5.0, 105.0, 105.0, 0.8),
            make_box(200.0, 200.0, 250.0, 250.0, 0.7),
        ];
        let result = nms(detections, 0.4);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn nms_empty() {
        assert!(nms(vec![], 0.4).is_empty());
    }

    #[test]
    fn decode_stride_single_anchor() {
        let stride = 8;
        let input = 640;
        let grid = input / stride;
        let n = grid * grid * ANCHORS_PER_CELL;

        let mut scores = vec![0.0f32; n];
        scores[0] = 0.9;
        let mut bboxes = vec![0.0f32; n * 4];
        bboxes[..4].copy_from_slice(&[1.0, 1.0, 1.0, 1.0]);

        let letterbox = Letterbox { scale: 1.0, orig_w: 640.0, orig_h: 640.0 };
        let dets = decode_stride(&scores, &bboxes, stride, input, &letterbox, 0.5);

        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        // anchor at (0, 0): left/top offsets clamp to 0, right/bottom = stride
        assert!(d.x1.abs() < 1e-6);
        assert!(d.y1.abs() < 1e-6);
        assert!((d.x2 - 8.0).abs() < 1e-6);
        assert!((d.y2 - 8.0).abs() < 1e-6);
        assert!((d.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn decode_stride_maps_back_through_scale() {
        let stride = 32;
        let input = 640;
        let grid = input / stride;
        let n = grid * grid * ANCHORS_PER_CELL;

        let mut scores = vec![0.0f32; n];
        // second cell, first anchor: idx = 2
        scores[2] = 0.8;
        let mut bboxes = vec![0.0f32; n * 4];
        bboxes[8..12].copy_from_slice(&[0.5, 0.5, 0.5, 0.5]);

        // 1280px-wide original → scale 0.5
        let letterbox = Letterbox { scale: 0.5, orig_w: 1280.0, orig_h: 960.0 };
        let dets = decode_stride(&scores, &bboxes, stride, input, &letterbox, 0.5);

        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        // anchor center (32, 0), half-stride offsets → letterboxed (16..48),
        // doubled back into original space
        assert!((d.x1 - 32.0).abs() < 1e-4);
        assert!((d.x2 - 96.0).abs() < 1e-4);
        assert!(d.y1.abs() < 1e-4);
        assert!((d.y2 - 32.0).abs() < 1e-4);
    }

    #[test]
    fn decode_stride_below_threshold_ignored() {
        let letterbox = Letterbox { scale: 1.0, orig_w: 640.0, orig_h: 640.0 };
        let scores = vec![0.3f32; 16];
        let bboxes = vec![1.0f32; 64];
        let dets = decode_stride(&scores, &bboxes, 160, 640, &letterbox, 0.5);
        assert!(dets.is_empty());
    }

    #[test]
    fn preprocess_shape_and_letterbox() {
        let image = DynamicImage::new_rgb8(1280, 960);
        let (shape, data, letterbox) = preprocess(&image);
        assert_eq!(shape, vec![1, 3, 640, 640]);
        assert_eq!(data.len(), 3 * 640 * 640);
        assert!((letterbox.scale - 0.5).abs() < 1e-6);
        assert_eq!(letterbox.orig_w, 1280.0);
        assert_eq!(letterbox.orig_h, 960.0);
    }

    #[test]
    fn preprocess_black_pixels_normalize_negative() {
        let image = DynamicImage::new_rgb8(640, 640);
        let (_, data, _) = preprocess(&image);
        let expected = (0.0 - MEAN) / STD;
        assert!((data[0] - expected).abs() < 1e-6);
    }
}
