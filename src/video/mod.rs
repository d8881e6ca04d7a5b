pub mod reader;
pub mod writer;

use anyhow::Result;
use opencv::core::{Mat, Size};

/// A finite, forward-only source of decoded frames. Not restartable
/// without reopening.
pub trait VideoReader {
    /// Declared frame count from container metadata (may be 0 when the
    /// container does not carry it).
    fn frame_count(&self) -> Result<usize>;
    fn source_fps(&self) -> Result<f64>;
    fn frame_size(&self) -> Result<Size>;
    /// Next frame in decode order, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

/// Destination for annotated frames, written in source order.
pub trait FrameSink {
    fn write(&mut self, frame: &Mat) -> Result<()>;
    /// Finalize the container. Also happens on drop, but calling it
    /// explicitly surfaces encoder errors.
    fn release(&mut self) -> Result<()>;
}
