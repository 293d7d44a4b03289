//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input videos or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(short, long, conflicts_with = "out_dir")]
    pub output: Option<PathBuf>,

    /// Directory for outputs (default: next to each input)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Spoken language of the videos
    #[arg(short, long, default_value = "it")]
    pub source_lang: String,

    /// Language to translate captions into
    #[arg(short, long, default_value = "en")]
    pub target_lang: String,

    /// Only subtitle the spoken language
    #[arg(long)]
    pub single_track: bool,

    /// Always burn subtitles into the frames
    #[arg(long)]
    pub burn_in: bool,

    /// Keep intermediate subtitle documents
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Maximum concurrent jobs (default: number of CPU cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Maximum characters per caption line
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Write the JSON job report here ("-" for stdout)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the segment command
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Transcript file (.json or .srt)
    pub transcript: PathBuf,

    /// Maximum characters per line
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Minimum caption duration in seconds
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Maximum lines per caption
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Output SRT file (default: stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Captions of the spoken language (SRT)
    pub captions: PathBuf,

    /// Translated captions (SRT), stacked as a second track
    #[arg(long)]
    pub translation: Option<PathBuf>,

    /// Language tag of the captions
    #[arg(long, default_value = "it")]
    pub source_lang: String,

    /// Language tag of the translation
    #[arg(long, default_value = "en")]
    pub target_lang: String,

    /// Frame width in pixels
    #[arg(long)]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long)]
    pub height: u32,

    /// Output ASS file (default: stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the restyle command
#[derive(Args, Debug)]
pub struct RestyleArgs {
    /// ASS document to edit
    pub document: PathBuf,

    /// Style (language tag) to change
    #[arg(long)]
    pub track: String,

    /// New vertical margin in script pixels
    #[arg(long)]
    pub margin_v: u32,

    /// New font size
    #[arg(long)]
    pub font_size: u32,

    /// Output file (default: overwrite the document)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
