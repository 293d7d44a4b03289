//! Command implementations

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::transcribe_command::read_transcript;
use crate::app::{expand_inputs, AppContainer, DefaultAppContainer, JobReport, JobRequest};
use crate::cli::args::{ProbeArgs, RenderArgs, RestyleArgs, RunArgs, SegmentArgs};
use crate::config::PipelineConfig;
use crate::domain::model::{Caption, MediaProfile, SubtitleTrack, TrackLane};
use crate::segmenter::CaptionSegmenter;
use crate::subtitles::{parse_srt, render_srt, SubtitleDocument, SubtitleRenderer};

/// Execute the run command. Fails when any job failed.
pub async fn run(args: RunArgs, mut config: PipelineConfig) -> Result<()> {
    if let Some(jobs) = args.jobs {
        config.concurrency.max_jobs = Some(jobs);
    }
    if let Some(max_chars) = args.max_chars {
        config.segmentation.max_chars_per_line = max_chars;
    }
    config.encoder.require_burn_in |= args.burn_in;
    config.scratch.keep_artifacts |= args.keep_artifacts;
    config.validate().context("Invalid configuration")?;

    let target_language = if args.single_track {
        None
    } else {
        if args.source_lang.eq_ignore_ascii_case(&args.target_lang) {
            bail!(
                "Source and target language are both '{}'; use --single-track for one language",
                args.source_lang
            );
        }
        Some(args.target_lang.clone())
    };

    let inputs = expand_inputs(&args.inputs);
    if inputs.is_empty() {
        bail!("No video files found in the given inputs");
    }
    if args.output.is_some() && inputs.len() > 1 {
        bail!("--output can only be used with a single input video");
    }
    for input in &inputs {
        if !input.exists() {
            bail!("Input file does not exist: {}", input.display());
        }
    }
    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let requests: Vec<JobRequest> = inputs
        .into_iter()
        .map(|input| JobRequest {
            input,
            output: args.output.clone(),
            out_dir: args.out_dir.clone(),
            source_language: args.source_lang.clone(),
            target_language: target_language.clone(),
        })
        .collect();

    let container = DefaultAppContainer::new(config);
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running jobs");
            signal_cancel.cancel();
        }
    });

    let reports = container.batch_interactor().run(requests, &cancel).await;
    write_reports(&reports, args.report.as_deref())?;

    let failed = reports.iter().filter(|r| !r.success).count();
    if failed > 0 {
        bail!("{} of {} jobs failed", failed, reports.len());
    }
    Ok(())
}

fn write_reports(reports: &[JobReport], destination: Option<&Path>) -> Result<()> {
    for report in reports {
        match (report.success, report.failed_stage) {
            (true, _) => println!("ok      {}", report.output.display()),
            (false, Some(stage)) => println!(
                "failed  {} ({}: {})",
                report.input.display(),
                stage,
                report.error.as_deref().unwrap_or("unknown error")
            ),
            (false, None) => println!("failed  {}", report.input.display()),
        }
    }

    let Some(destination) = destination else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(reports).context("Failed to serialize job reports")?;
    if destination == Path::new("-") {
        println!("{}", json);
    } else {
        fs::write(destination, json)
            .with_context(|| format!("Failed to write report to {}", destination.display()))?;
        info!("Report written to {}", destination.display());
    }
    Ok(())
}

/// Execute the probe command
pub async fn probe(args: ProbeArgs, config: PipelineConfig) -> Result<()> {
    if !args.input.exists() {
        bail!("Input file does not exist: {}", args.input.display());
    }
    let container = DefaultAppContainer::new(config);
    let profile = container
        .probe_port()
        .probe(&args.input)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("File: {}", args.input.display());
        println!("Container: {}", profile.container);
        println!("Duration: {:.2}s", profile.duration_seconds);
        println!("Video: {} {}x{}", profile.video_codec, profile.width, profile.height);
        println!("Audio: {}", profile.audio_codec.as_deref().unwrap_or("none"));
    }
    Ok(())
}

/// Execute the segment command
pub fn segment(args: SegmentArgs, config: PipelineConfig) -> Result<()> {
    let mut seg_config = config.segmentation;
    if let Some(max_chars) = args.max_chars {
        seg_config.max_chars_per_line = max_chars;
    }
    if let Some(min_duration) = args.min_duration {
        seg_config.min_duration_seconds = min_duration;
    }
    if let Some(max_lines) = args.max_lines {
        seg_config.max_lines_per_caption = max_lines;
    }

    let transcript = read_transcript(&args.transcript)
        .with_context(|| format!("Failed to read transcript {}", args.transcript.display()))?;
    let outcome = CaptionSegmenter::from_config(&seg_config).segment_with_report(&transcript);
    for skipped in &outcome.skipped {
        warn!("Skipped segment: {}", skipped);
    }
    info!(
        "{} transcript segments became {} captions",
        transcript.len(),
        outcome.captions.len()
    );

    emit(&render_srt(&outcome.captions, TrackLane::Source), args.out.as_deref())
}

/// Execute the render command
pub fn render(args: RenderArgs, config: PipelineConfig) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("Frame size must be positive, got {}x{}", args.width, args.height);
    }
    let mut captions = read_srt_captions(&args.captions)?;
    let profile = MediaProfile {
        video_codec: String::new(),
        audio_codec: None,
        width: args.width,
        height: args.height,
        duration_seconds: 0.0,
        container: String::new(),
    };
    let layout = &config.layout;
    let source_style = config
        .styles
        .source
        .resolve(&args.source_lang, args.height, layout);
    let renderer = SubtitleRenderer::new(layout.clone());

    let document = match &args.translation {
        None => renderer.render(
            &SubtitleTrack::new(captions, source_style, TrackLane::Source),
            &profile,
        ),
        Some(path) => {
            if args.source_lang.eq_ignore_ascii_case(&args.target_lang) {
                bail!("Source and target language must differ for a dual-track document");
            }
            let translated = read_srt_captions(path)?;
            if translated.len() != captions.len() {
                bail!(
                    "Caption count mismatch: {} has {}, {} has {}",
                    args.captions.display(),
                    captions.len(),
                    path.display(),
                    translated.len()
                );
            }
            for (caption, translation) in captions.iter_mut().zip(translated) {
                caption.translated_text = Some(translation.source_text);
            }
            let translation_style = config
                .styles
                .translation
                .resolve(&args.target_lang, args.height, layout);
            let source = SubtitleTrack::new(captions.clone(), source_style, TrackLane::Source);
            let translation =
                SubtitleTrack::new(captions, translation_style, TrackLane::Translation);
            if layout.translation_on_bottom {
                renderer.render_dual(&translation, &source, &profile)
            } else {
                renderer.render_dual(&source, &translation, &profile)
            }
        }
    };

    emit(&document.to_ass_string(), args.out.as_deref())
}

/// Execute the restyle command
pub fn restyle(args: RestyleArgs) -> Result<()> {
    let content = fs::read_to_string(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let mut document = SubtitleDocument::parse(&content)
        .with_context(|| format!("Failed to parse {}", args.document.display()))?;
    document
        .restyle(&args.track, args.margin_v, args.font_size)
        .context("Restyle failed")?;

    let destination = args.out.as_deref().unwrap_or(&args.document);
    fs::write(destination, document.to_ass_string())
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    info!(
        "Track {} set to MarginV {} and font size {} in {}",
        args.track,
        args.margin_v,
        args.font_size,
        destination.display()
    );
    Ok(())
}

fn read_srt_captions(path: &Path) -> Result<Vec<Caption>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let segments =
        parse_srt(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(segments
        .into_iter()
        .map(|s| Caption::new(s.start_seconds, s.end_seconds, s.text))
        .collect())
}

/// Write to a file, or stdout when no path is given
fn emit(content: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
