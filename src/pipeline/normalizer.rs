// Face normalization: crop the detection box out of the frame and resize
// it to the square input the classifier expects.

use crate::pipeline::types::Detection;
use anyhow::{anyhow, Result};
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};

/// Produces a fixed-size aligned face crop for classification.
pub trait FaceNormalizer {
    fn align(&self, frame: &Mat, detection: &Detection) -> Result<Mat>;
}

pub struct CropNormalizer {
    output_size: i32,
}

impl CropNormalizer {
    pub fn new(output_size: i32) -> Self {
        Self { output_size }
    }
}

impl FaceNormalizer for CropNormalizer {
    fn align(&self, frame: &Mat, detection: &Detection) -> Result<Mat> {
        let size = frame.size()?;
        let roi = detection
            .bbox
            .clamped_to(size.width, size.height)
            .ok_or_else(|| {
                anyhow!(
                    "Detection box {:?} lies outside the {}x{} frame",
                    detection.bbox,
                    size.width,
                    size.height
                )
            })?;

        let cropped = Mat::roi(frame, roi)?;
        let mut owned = Mat::default();
        cropped.copy_to(&mut owned)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &owned,
            &mut resized,
            Size::new(self.output_size, self.output_size),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        Ok(resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{BBox, Point};
    use opencv::core::{Scalar, CV_8UC3};

    fn detection(bbox: BBox) -> Detection {
        Detection {
            bbox,
            confidence: 0.9,
            landmarks: [Point { x: 0.0, y: 0.0 }; 5],
        }
    }

    fn gray_frame(w: i32, h: i32) -> Mat {
        Mat::new_rows_cols_with_default(h, w, CV_8UC3, Scalar::all(128.0)).unwrap()
    }

    #[test]
    fn test_align_outputs_fixed_size() {
        let frame = gray_frame(640, 480);
        let normalizer = CropNormalizer::new(224);

        let crop = normalizer
            .align(&frame, &detection(BBox::new(100.0, 50.0, 80.0, 120.0)))
            .unwrap();
        let size = crop.size().unwrap();
        assert_eq!((size.width, size.height), (224, 224));
    }

    #[test]
    fn test_align_clamps_overhanging_box() {
        let frame = gray_frame(200, 200);
        let normalizer = CropNormalizer::new(160);

        // Box partially outside the frame still yields a full-size crop
        let crop = normalizer
            .align(&frame, &detection(BBox::new(150.0, 150.0, 100.0, 100.0)))
            .unwrap();
        let size = crop.size().unwrap();
        assert_eq!((size.width, size.height), (160, 160));
    }

    #[test]
    fn test_align_rejects_box_outside_frame() {
        let frame = gray_frame(100, 100);
        let normalizer = CropNormalizer::new(224);

        let result = normalizer.align(&frame, &detection(BBox::new(500.0, 500.0, 50.0, 50.0)));
        assert!(result.is_err());
    }
}
