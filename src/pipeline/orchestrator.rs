// Pipeline orchestrator: the per-frame control loop.
//
// Pulls frames from the reader in decode order, locates faces, classifies
// each processed detection, annotates the frame, and pushes every frame
// (annotated or not) to the sink. Strictly single-threaded and
// synchronous; no state is carried across frames beyond the counter.

use crate::pipeline::annotator;
use crate::pipeline::classifier::SpoofClassifier;
use crate::pipeline::detector::FaceLocator;
use crate::pipeline::normalizer::FaceNormalizer;
use crate::pipeline::types::AnnotateScope;
use crate::video::{FrameSink, VideoReader};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::{Mat, Vector};
use opencv::imgcodecs;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub struct RunOptions {
    pub scope: AnnotateScope,
    /// Dump directory for per-frame debug images, when enabled.
    pub debug_dump: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RunStats {
    pub frames: usize,
    pub faces: usize,
    pub elapsed: Duration,
}

pub struct Pipeline {
    locator: Box<dyn FaceLocator>,
    normalizer: Box<dyn FaceNormalizer>,
    classifier: Box<dyn SpoofClassifier>,
    options: RunOptions,
}

impl Pipeline {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        normalizer: Box<dyn FaceNormalizer>,
        classifier: Box<dyn SpoofClassifier>,
        options: RunOptions,
    ) -> Self {
        Self {
            locator,
            normalizer,
            classifier,
            options,
        }
    }

    /// Process the whole video. Output frame count equals input frame
    /// count, in source order. The sink is finalized on success; on an
    /// early error both reader and sink are released by their Drop impls.
    pub fn run(
        &mut self,
        reader: &mut dyn VideoReader,
        sink: &mut dyn FrameSink,
    ) -> Result<RunStats> {
        if let Some(dir) = &self.options.debug_dump {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create frames folder at {:?}", dir))?;
        }

        let pb = progress_bar(reader.frame_count()?)?;
        let start = Instant::now();
        let mut frames = 0usize;
        let mut faces = 0usize;

        while let Some(mut frame) = reader.next_frame()? {
            frames += 1;

            let detections = self.locator.detect(&frame)?;
            if !detections.is_empty() {
                if let Some(dir) = &self.options.debug_dump {
                    dump_image(dir, &format!("original{}.png", frames), &frame)?;
                }

                let take = self.options.scope.take_count(detections.len());
                for detection in detections.iter().take(take) {
                    let crop = self.normalizer.align(&frame, detection)?;
                    if let Some(dir) = &self.options.debug_dump {
                        dump_image(dir, &format!("{}.png", frames), &crop)?;
                    }

                    let verdict = self.classifier.classify(&crop)?;
                    annotator::annotate(&mut frame, detection, &verdict)?;
                    faces += 1;
                }
            }

            sink.write(&frame)?;
            pb.inc(1);
        }

        pb.finish_and_clear();
        sink.release()?;

        let stats = RunStats {
            frames,
            faces,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Pipeline finished: {} frames, {} faces classified, {:.2}s",
            stats.frames,
            stats.faces,
            stats.elapsed.as_secs_f64()
        );
        Ok(stats)
    }
}

fn progress_bar(total_frames: usize) -> Result<ProgressBar> {
    // Frame count from container metadata can be missing; fall back to a
    // spinner rather than a bar stuck at 0/0.
    let pb = if total_frames > 0 {
        ProgressBar::new(total_frames as u64)
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})",
            )?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn dump_image(dir: &Path, name: &str, image: &Mat) -> Result<()> {
    let path = dir.join(name);
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Non-UTF8 dump path: {:?}", path))?;
    let written = imgcodecs::imwrite(path_str, image, &Vector::new())?;
    if !written {
        tracing::warn!("Failed to write debug image {}", path_str);
    }
    Ok(())
}
