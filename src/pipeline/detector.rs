// Face locator backed by OpenCV's YuNet detector.
//
// The model itself is an external capability; this adapter only loads it,
// feeds it frames, and parses its output rows into `Detection`s.

use crate::pipeline::types::{BBox, Detection, Point};
use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Ptr, Size},
    dnn::{DNN_BACKEND_OPENCV, DNN_TARGET_CPU},
    objdetect::FaceDetectorYN,
    prelude::*,
};
use std::path::Path;

/// Default confidence threshold below which candidate faces are discarded.
pub const SCORE_THRESHOLD: f32 = 0.8;
/// Non-maximum-suppression threshold for overlapping candidates.
const NMS_THRESHOLD: f32 = 0.3;
/// Keep at most this many candidates before NMS.
const TOP_K: i32 = 500;

/// Locates faces in a frame. Returns zero or more detections, best first.
pub trait FaceLocator {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>>;
}

pub struct YunetLocator {
    detector: Ptr<FaceDetectorYN>,
    score_threshold: f32,
}

impl YunetLocator {
    pub fn new(model_path: &Path, score_threshold: f32) -> Result<Self> {
        let model_str = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Non-UTF8 detector model path: {:?}", model_path))?;

        let detector = FaceDetectorYN::create(
            model_str,
            "",
            Size::new(320, 320),
            score_threshold,
            NMS_THRESHOLD,
            TOP_K,
            DNN_BACKEND_OPENCV,
            DNN_TARGET_CPU,
        )
        .with_context(|| format!("Failed to load face detector model at: '{}'", model_str))?;

        tracing::info!("YunetLocator: loaded {}", model_str);

        Ok(Self {
            detector,
            score_threshold,
        })
    }
}

impl FaceLocator for YunetLocator {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        if frame.empty() {
            return Ok(Vec::new());
        }

        // YuNet emits coordinates relative to its configured input size, so
        // match it to the frame and skip any coordinate rescaling.
        self.detector.set_input_size(frame.size()?)?;

        let mut faces = Mat::default();
        self.detector.detect(frame, &mut faces)?;

        parse_faces(&faces, self.score_threshold)
    }
}

/// Parse the YuNet output matrix. One row per candidate:
/// [x, y, w, h, lm0x, lm0y, ..., lm4x, lm4y, score]
/// with landmarks ordered right eye, left eye, nose tip, right mouth
/// corner, left mouth corner.
fn parse_faces(faces: &Mat, score_threshold: f32) -> Result<Vec<Detection>> {
    let rows = faces.rows();
    if rows <= 0 {
        return Ok(Vec::new());
    }
    if faces.cols() < 15 {
        return Err(anyhow!(
            "Unexpected detector output: {} columns (expected 15)",
            faces.cols()
        ));
    }

    let mut detections = Vec::with_capacity(rows as usize);
    for i in 0..rows {
        let at = |j: i32| -> Result<f32> { Ok(*faces.at_2d::<f32>(i, j)?) };

        let bbox = BBox::new(at(0)?, at(1)?, at(2)?, at(3)?);
        let score = at(14)?;

        if bbox.w <= 0.0 || bbox.h <= 0.0 || score < score_threshold {
            continue;
        }

        let mut landmarks = [Point { x: 0.0, y: 0.0 }; 5];
        for (k, lm) in landmarks.iter_mut().enumerate() {
            lm.x = at(4 + 2 * k as i32)?;
            lm.y = at(5 + 2 * k as i32)?;
        }

        detections.push(Detection {
            bbox,
            confidence: score,
            landmarks,
        });
    }

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_row(x: f32, y: f32, w: f32, h: f32, score: f32) -> [f32; 15] {
        let mut row = [0.0f32; 15];
        row[0] = x;
        row[1] = y;
        row[2] = w;
        row[3] = h;
        // Synthetic landmarks inside the box
        for k in 0..5 {
            row[4 + 2 * k] = x + k as f32;
            row[5 + 2 * k] = y + k as f32;
        }
        row[14] = score;
        row
    }

    #[test]
    fn test_parse_empty_output() {
        let faces = Mat::default();
        assert!(parse_faces(&faces, 0.8).unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_face() {
        let row = face_row(10.0, 20.0, 50.0, 60.0, 0.95);
        let faces = Mat::from_slice_2d(&[&row[..]]).unwrap();

        let detections = parse_faces(&faces, 0.8).unwrap();
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        assert_eq!(d.bbox, BBox::new(10.0, 20.0, 50.0, 60.0));
        assert!((d.confidence - 0.95).abs() < 1e-6);
        assert_eq!(d.landmarks[2], Point { x: 12.0, y: 22.0 });
    }

    #[test]
    fn test_parse_filters_low_score_and_degenerate() {
        let good = face_row(0.0, 0.0, 40.0, 40.0, 0.9);
        let weak = face_row(5.0, 5.0, 40.0, 40.0, 0.4);
        let flat = face_row(5.0, 5.0, 0.0, 40.0, 0.9);
        let faces = Mat::from_slice_2d(&[&good[..], &weak[..], &flat[..]]).unwrap();

        let detections = parse_faces(&faces, 0.8).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox.w, 40.0);
    }

    #[test]
    fn test_parse_rejects_short_rows() {
        let row = [0.5f32; 4];
        let faces = Mat::from_slice_2d(&[&row[..]]).unwrap();
        assert!(parse_faces(&faces, 0.8).is_err());
    }
}
