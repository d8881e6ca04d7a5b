use crate::pipeline::types::AnnotateScope;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run a face detector and a live/spoof classifier over a video",
    long_about = None
)]
pub struct Args {
    /// Path to the input video
    pub video: PathBuf,

    /// Path to the YAML settings file
    #[arg(short = 'c', long)]
    pub configs: PathBuf,

    /// Path to the annotated output video
    #[arg(short = 'o', long, default_value = "output/output.avi")]
    pub output_file: PathBuf,

    /// Dump per-frame debug images into the configured frames folder
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Annotate only the first detection per frame, or all of them
    #[arg(long, value_enum, default_value_t = AnnotateScope::First)]
    pub annotate: AnnotateScope,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let args = Args::try_parse_from(["vigilant", "in.mp4", "--configs", "cfg.yaml"]).unwrap();
        assert_eq!(args.video, PathBuf::from("in.mp4"));
        assert_eq!(args.output_file, PathBuf::from("output/output.avi"));
        assert!(!args.debug);
        assert_eq!(args.annotate, AnnotateScope::First);
    }

    #[test]
    fn test_full_invocation() {
        let args = Args::try_parse_from([
            "vigilant",
            "in.mp4",
            "-c",
            "cfg.yaml",
            "-o",
            "out.avi",
            "-d",
            "--annotate",
            "all",
        ])
        .unwrap();
        assert_eq!(args.output_file, PathBuf::from("out.avi"));
        assert!(args.debug);
        assert_eq!(args.annotate, AnnotateScope::All);
    }

    #[test]
    fn test_configs_is_required() {
        assert!(Args::try_parse_from(["vigilant", "in.mp4"]).is_err());
    }
}
