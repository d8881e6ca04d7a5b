pub mod annotator;
pub mod classifier;
pub mod detector;
pub mod normalizer;
pub mod orchestrator;
pub mod types;
