// Core data types shared across the pipeline stages.

use clap::ValueEnum;
use opencv::core::Rect;

/// A 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Clamp the box to a `frame_w` x `frame_h` frame. Returns `None` when
    /// nothing of the box remains inside the frame.
    pub fn clamped_to(&self, frame_w: i32, frame_h: i32) -> Option<Rect> {
        let x = (self.x.round() as i32).clamp(0, frame_w);
        let y = (self.y.round() as i32).clamp(0, frame_h);
        let w = (self.w.round() as i32).clamp(0, frame_w - x);
        let h = (self.h.round() as i32).clamp(0, frame_h - y);

        if w <= 0 || h <= 0 {
            return None;
        }
        Some(Rect::new(x, y, w, h))
    }

    /// Bottom-right corner, used as the text anchor when annotating.
    pub fn bottom_right(&self) -> (i32, i32) {
        (
            (self.x + self.w).round() as i32,
            (self.y + self.h).round() as i32,
        )
    }
}

/// One detected face: box, detector confidence, and the five facial
/// landmarks (eyes, nose tip, mouth corners).
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
    pub landmarks: [Point; 5],
}

/// The two classes the spoof classifier distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Live,
    Spoof,
}

impl Label {
    /// Class index as emitted by the classifier head (0 = Live, 1 = Spoof).
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Label::Live,
            _ => Label::Spoof,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Live => "Live",
            Label::Spoof => "Spoof",
        }
    }
}

/// Classifier output: the decided label plus the raw score vector.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub label: Label,
    pub scores: Vec<f32>,
}

impl Verdict {
    /// Argmax over the raw scores. An empty score vector defaults to class
    /// index 0, which cannot happen with a well-formed model output.
    pub fn from_scores(scores: Vec<f32>) -> Self {
        let index = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Self {
            label: Label::from_index(index),
            scores,
        }
    }
}

/// Which detections of a frame get classified and annotated.
///
/// The two historical entry points disagreed on this, so it is surfaced as
/// an explicit option instead of being hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnnotateScope {
    /// Only the first (highest-ranked) detection per frame
    First,
    /// Every detection per frame
    All,
}

impl AnnotateScope {
    pub fn take_count(&self, detections: usize) -> usize {
        match self {
            AnnotateScope::First => detections.min(1),
            AnnotateScope::All => detections,
        }
    }
}
