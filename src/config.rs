// Settings file handling
//
// The settings file is YAML, loaded once at startup and immutable for the
// life of the process.

use crate::pipeline::classifier::Backbone;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Compute device for the classifier runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Device {
    Cpu,
    Cuda(u32),
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl TryFrom<String> for Device {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_lowercase();
        if value == "cpu" {
            return Ok(Device::Cpu);
        }
        if value == "cuda" {
            return Ok(Device::Cuda(0));
        }
        if let Some(ordinal) = value.strip_prefix("cuda:") {
            let ordinal = ordinal
                .parse::<u32>()
                .map_err(|_| format!("Invalid device ordinal in '{}'", value))?;
            return Ok(Device::Cuda(ordinal));
        }
        Err(format!(
            "Unknown device '{}' (expected 'cpu' or 'cuda:<n>')",
            value
        ))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(n) => write!(f, "cuda:{}", n),
        }
    }
}

/// Settings consumed from the YAML file passed via `--configs`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Classifier checkpoint (ONNX)
    pub weights: PathBuf,
    /// Face detector model (ONNX)
    pub detector_model: PathBuf,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub backbone: Backbone,
    /// Directory for debug frame dumps
    #[serde(default = "default_frames_folder")]
    pub frames_folder: PathBuf,
}

fn default_frames_folder() -> PathBuf {
    PathBuf::from("frames")
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file at {:?}", path))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Malformed settings file at {:?}", path))?;
        Ok(settings)
    }
}
