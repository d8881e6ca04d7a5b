mod cli;
mod config;
mod pipeline;
mod video;

use anyhow::{Context, Result};
use cli::Args;
use config::Settings;
use pipeline::classifier::OnnxClassifier;
use pipeline::detector::{YunetLocator, SCORE_THRESHOLD};
use pipeline::normalizer::CropNormalizer;
use pipeline::orchestrator::{Pipeline, RunOptions};
use std::fs;
use std::time::Instant;
use video::reader::OpencvReader;
use video::writer::OpencvWriter;
use video::VideoReader;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let settings = Settings::load(&args.configs)?;

    if let Some(parent) = args.output_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }
    }

    tracing::info!("Starting...");
    let start = Instant::now();

    let mut reader = OpencvReader::open(&args.video)?;
    let mut sink = OpencvWriter::create(
        &args.output_file,
        reader.source_fps()?,
        reader.frame_size()?,
    )?;

    let locator = YunetLocator::new(&settings.detector_model, SCORE_THRESHOLD)?;
    let normalizer = CropNormalizer::new(settings.backbone.input_size());
    let classifier = OnnxClassifier::new(&settings.weights, settings.backbone, settings.device)?;

    let mut pipeline = Pipeline::new(
        Box::new(locator),
        Box::new(normalizer),
        Box::new(classifier),
        RunOptions {
            scope: args.annotate,
            debug_dump: args.debug.then(|| settings.frames_folder.clone()),
        },
    );

    let stats = pipeline.run(&mut reader, &mut sink)?;

    tracing::info!(
        "Wrote {:?}: {} frames, {} faces classified",
        args.output_file,
        stats.frames,
        stats.faces
    );
    println!("Running time: {:.3} ms", start.elapsed().as_secs_f64() * 1000.0);

    Ok(())
}
