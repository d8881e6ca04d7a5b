// Spoof classifier backed by an ONNX Runtime session.
//
// The network architecture is opaque; the adapter loads the checkpoint,
// turns a face crop into the tensor layout the backbone was trained on,
// and argmaxes the two output logits.

use crate::config::Device;
use crate::pipeline::types::Verdict;
use anyhow::{anyhow, Context, Result};
use ndarray::Array4;
use opencv::{core::Mat, imgproc, prelude::*};
use ort::{CUDAExecutionProvider, ExecutionProvider, GraphOptimizationLevel, Session, Value};
use serde::Deserialize;
use std::path::Path;

/// Classifier backbone. Selects the input resolution and the pixel
/// normalization the checkpoint was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backbone {
    #[default]
    Resnet18,
    Scan,
}

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

impl Backbone {
    /// Side length of the square face crop the network expects.
    pub fn input_size(&self) -> i32 {
        match self {
            Backbone::Resnet18 => 224,
            Backbone::Scan => 160,
        }
    }

    /// Map one RGB channel byte to the normalized float the network sees.
    pub fn normalize(&self, channel: usize, value: u8) -> f32 {
        match self {
            Backbone::Resnet18 => {
                (value as f32 / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
            }
            Backbone::Scan => (value as f32 - 127.5) / 128.0,
        }
    }
}

/// Provider registration falls back to CPU instead of failing the run;
/// this makes the mismatch with the configured device visible in the log.
fn unavailable_device_warning(device: Device, available: bool) -> Option<String> {
    match device {
        Device::Cuda(_) if !available => Some(format!(
            "Device {} is not available in this build; classifier inference falls back to CPU",
            device
        )),
        _ => None,
    }
}

/// Classifies one normalized face crop as Live or Spoof.
pub trait SpoofClassifier {
    fn classify(&mut self, face: &Mat) -> Result<Verdict>;
}

pub struct OnnxClassifier {
    session: Session,
    backbone: Backbone,
}

impl OnnxClassifier {
    pub fn new(weights: &Path, backbone: Backbone, device: Device) -> Result<Self> {
        let mut builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

        if let Device::Cuda(ordinal) = device {
            let cuda = CUDAExecutionProvider::default().with_device_id(ordinal as i32);
            let available = matches!(cuda.is_available(), Ok(true));
            if let Some(warning) = unavailable_device_warning(device, available) {
                tracing::warn!("{}", warning);
            }
            builder = builder.with_execution_providers([cuda.build()])?;
        }

        let session = builder
            .commit_from_file(weights)
            .with_context(|| format!("Failed to load classifier weights at {:?}", weights))?;

        tracing::info!(
            "OnnxClassifier: loaded {:?} ({:?} backbone, device {})",
            weights,
            backbone,
            device
        );

        Ok(Self { session, backbone })
    }

    /// BGR face crop -> normalized NCHW RGB tensor with a batch dim of 1.
    fn preprocess(&self, face: &Mat) -> Result<Array4<f32>> {
        let size = face.size()?;
        let expected = self.backbone.input_size();
        if size.width != expected || size.height != expected {
            return Err(anyhow!(
                "Classifier expects a {0}x{0} crop, got {1}x{2}",
                expected,
                size.width,
                size.height
            ));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(face, &mut rgb, imgproc::COLOR_BGR2RGB)?;
        if !rgb.is_continuous() {
            return Err(anyhow!("Face crop Mat is not continuous"));
        }

        let bytes = rgb.data_bytes()?;
        let side = expected as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
        for y in 0..side {
            for x in 0..side {
                let base = (y * side + x) * 3;
                for c in 0..3 {
                    tensor[[0, c, y, x]] = self.backbone.normalize(c, bytes[base + c]);
                }
            }
        }

        Ok(tensor)
    }
}

impl SpoofClassifier for OnnxClassifier {
    fn classify(&mut self, face: &Mat) -> Result<Verdict> {
        let tensor = self.preprocess(face)?;

        let input = Value::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input]?)?;

        let logits = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Classifier output is not an f32 tensor")?;
        let scores: Vec<f32> = logits.iter().copied().collect();
        if scores.len() < 2 {
            return Err(anyhow!(
                "Classifier produced {} logits, expected 2",
                scores.len()
            ));
        }

        Ok(Verdict::from_scores(scores))
    }
}
