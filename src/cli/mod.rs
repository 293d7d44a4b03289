//! CLI module for bisub
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// bisub - bilingual subtitles for tutorial videos
///
/// Transcribes the spoken language, translates it, and writes a video carrying
/// both languages as stacked subtitles.
#[derive(Parser, Debug)]
#[command(name = "bisub")]
#[command(about = "Transcribe, translate and mux dual-language subtitles into videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./bisub.toml when present)
    #[arg(long, global = true, env = "BISUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true, env = "BISUB_LOG_LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline on videos or directories of videos
    Run(args::RunArgs),
    /// Print what the prober sees in a video
    Probe(args::ProbeArgs),
    /// Re-chunk a transcript into display-sized captions (SRT output)
    Segment(args::SegmentArgs),
    /// Render one or two SRT tracks into a styled ASS document
    Render(args::RenderArgs),
    /// Change one track's margin and font size in an ASS document
    Restyle(args::RestyleArgs),
}
