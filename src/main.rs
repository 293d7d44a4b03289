//! bisub command-line entry point
//!
//! # Usage
//!
//! ```bash
//! bisub run lezione-01.mp4 --source-lang it --target-lang en
//! bisub run ./corso --out-dir ./subbed --jobs 2 --report report.json
//! bisub probe lezione-01.mp4 --json
//! bisub segment transcript.json --max-chars 38 --out captions.srt
//! bisub render captions.it.srt --translation captions.en.srt --width 1920 --height 1080
//! bisub restyle lezione-01.ass --track en --margin-v 140 --font-size 40
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use bisub::adapters::toml_config::TomlConfigLoader;
use bisub::adapters::tracing_log::{init_logging, parse_log_level};
use bisub::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = parse_log_level(&cli.log_level).map_err(|e| anyhow!(e))?;
    init_logging(&level, cli.log_json);
    debug!("bisub {} starting", env!("CARGO_PKG_VERSION"));

    let config =
        TomlConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            commands::run(args, config).await
        }
        Commands::Probe(args) => commands::probe(args, config).await,
        Commands::Segment(args) => commands::segment(args, config),
        Commands::Render(args) => commands::render(args, config),
        Commands::Restyle(args) => commands::restyle(args),
    }
}
