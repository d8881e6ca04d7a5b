// Frame annotation: bounding box plus detector confidence and the
// classifier verdict as text near the box corner. Mutates the frame in
// place; OpenCV clips drawing that falls outside the frame.

use crate::pipeline::types::{Detection, Verdict};
use anyhow::Result;
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};

const THICKNESS: i32 = 2;
const FONT_SCALE: f64 = 1.0;
/// Vertical gap between the confidence line and the label line.
const TEXT_OFFSET: i32 = 30;

fn red() -> Scalar {
    // BGR
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

pub fn annotate(frame: &mut Mat, detection: &Detection, verdict: &Verdict) -> Result<()> {
    let size = frame.size()?;
    if let Some(rect) = detection.bbox.clamped_to(size.width, size.height) {
        imgproc::rectangle(frame, rect, red(), THICKNESS, LINE_8, 0)?;
    }

    let (x, y) = detection.bbox.bottom_right();

    imgproc::put_text(
        frame,
        &format!("FDet: {:.2}", detection.confidence),
        Point::new(x, y - TEXT_OFFSET),
        FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        red(),
        THICKNESS,
        LINE_AA,
        false,
    )?;

    imgproc::put_text(
        frame,
        verdict.label.as_str(),
        Point::new(x, y),
        FONT_HERSHEY_SIMPLEX,
        FONT_SCALE,
        red(),
        THICKNESS,
        LINE_AA,
        false,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{BBox, Label, Point as LmPoint};
    use opencv::core::{Scalar, Vec3b, CV_8UC3};

    fn black_frame(w: i32, h: i32) -> Mat {
        Mat::new_rows_cols_with_default(h, w, CV_8UC3, Scalar::all(0.0)).unwrap()
    }

    fn detection(bbox: BBox) -> Detection {
        Detection {
            bbox,
            confidence: 0.91,
            landmarks: [LmPoint { x: 0.0, y: 0.0 }; 5],
        }
    }

    fn verdict(label: Label) -> Verdict {
        Verdict {
            label,
            scores: vec![1.0, 0.0],
        }
    }

    #[test]
    fn test_annotate_draws_red_box_edge() {
        let mut frame = black_frame(200, 200);
        annotate(
            &mut frame,
            &detection(BBox::new(50.0, 50.0, 60.0, 60.0)),
            &verdict(Label::Live),
        )
        .unwrap();

        // Top edge of the rectangle is red in BGR
        let px: Vec3b = *frame.at_2d::<Vec3b>(50, 80).unwrap();
        assert_eq!(px[2], 255);
        assert_eq!(px[0], 0);

        // Interior of the box stays untouched
        let inner: Vec3b = *frame.at_2d::<Vec3b>(80, 80).unwrap();
        assert_eq!(inner, Vec3b::from([0, 0, 0]));
    }

    #[test]
    fn test_annotate_clips_out_of_bounds_box() {
        let mut frame = black_frame(100, 100);
        // Box hanging off the frame must not error
        annotate(
            &mut frame,
            &detection(BBox::new(80.0, 80.0, 60.0, 60.0)),
            &verdict(Label::Spoof),
        )
        .unwrap();
    }

    #[test]
    fn test_annotate_skips_rectangle_for_offscreen_box() {
        let mut frame = black_frame(100, 100);
        // The frame size is consulted to clamp the box; a box entirely
        // outside it draws no rectangle and the text clips away too
        annotate(
            &mut frame,
            &detection(BBox::new(300.0, 300.0, 40.0, 40.0)),
            &verdict(Label::Live),
        )
        .unwrap();

        for y in 0..100 {
            for x in 0..100 {
                let px: Vec3b = *frame.at_2d::<Vec3b>(y, x).unwrap();
                assert_eq!(px, Vec3b::from([0, 0, 0]));
            }
        }
    }

    #[test]
    fn test_unannotated_frame_stays_black() {
        let frame = black_frame(50, 50);
        let mut sum = 0u32;
        for y in 0..50 {
            for x in 0..50 {
                let px: Vec3b = *frame.at_2d::<Vec3b>(y, x).unwrap();
                sum += px[0] as u32 + px[1] as u32 + px[2] as u32;
            }
        }
        assert_eq!(sum, 0);
    }
}
