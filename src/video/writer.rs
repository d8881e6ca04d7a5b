use super::FrameSink;
use anyhow::{anyhow, Context, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::Path;

/// Encodes frames into an AVI container at the source frame rate and
/// resolution. XVID keeps the output playable without extra codecs.
pub struct OpencvWriter {
    writer: VideoWriter,
}

impl OpencvWriter {
    pub fn create(path: &Path, fps: f64, frame_size: Size) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Non-UTF8 output path: {:?}", path))?;

        let fourcc = VideoWriter::fourcc('X', 'V', 'I', 'D')?;
        let writer = VideoWriter::new(path_str, fourcc, fps, frame_size, true)
            .with_context(|| format!("Failed to open video writer at: '{}'", path_str))?;
        if !writer.is_opened()? {
            return Err(anyhow!("Video writer refused output path: {}", path_str));
        }

        tracing::info!(
            "OpencvWriter: writing {} at {:.2} fps, {}x{}",
            path_str,
            fps,
            frame_size.width,
            frame_size.height
        );

        Ok(Self { writer })
    }
}

impl FrameSink for OpencvWriter {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}
