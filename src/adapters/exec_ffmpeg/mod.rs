//! FFmpeg execution adapter
//!
//! Spawns the encoder as a child process. The child is killed when its
//! handle drops, so a timeout or a cancellation never leaves an orphan.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::MuxError;
use crate::ports::{EncoderInvocation, EncoderPort};

/// Lines of encoder stderr kept for error reports
const STDERR_TAIL_LINES: usize = 12;

/// FFmpeg-based encoder adapter
pub struct FfmpegEncoder {
    ffmpeg_path: String,
}

impl FfmpegEncoder {
    /// Create new FFmpeg adapter using the given executable
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl EncoderPort for FfmpegEncoder {
    async fn run(
        &self,
        invocation: &EncoderInvocation,
        cancel: &CancellationToken,
    ) -> Result<(), MuxError> {
        info!(
            "Running {} on the {} -> {}",
            self.ffmpeg_path,
            invocation.path,
            invocation.output_path.display()
        );
        debug!("{} {}", self.ffmpeg_path, invocation.args.join(" "));

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MuxError::Spawn(format!("{}: {}", self.ffmpeg_path, e)))?;

        // Drain stderr concurrently so a chatty encoder never blocks on a full pipe
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).to_string()
        });

        let outcome = tokio::select! {
            status = child.wait() => Wait::Exited(status),
            _ = tokio::time::sleep(invocation.timeout) => Wait::TimedOut,
            _ = cancel.cancelled() => Wait::Cancelled,
        };

        let status = match outcome {
            Wait::Exited(status) => status?,
            Wait::TimedOut => {
                warn!(
                    "Encoder exceeded {}s on the {}, killing it",
                    invocation.timeout.as_secs(),
                    invocation.path
                );
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(MuxError::Timeout {
                    path: invocation.path,
                    seconds: invocation.timeout.as_secs(),
                });
            }
            Wait::Cancelled => {
                info!("Cancellation requested, killing encoder");
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(MuxError::Cancelled);
            }
        };

        let stderr = stderr_task.await.unwrap_or_default();
        if status.success() {
            debug!("Encoder finished on the {}", invocation.path);
            return Ok(());
        }

        for line in stderr.lines() {
            debug!("ffmpeg: {}", line);
        }
        Err(MuxError::EncoderFailed {
            path: invocation.path,
            code: status.code(),
            stderr_tail: stderr_tail(&stderr, STDERR_TAIL_LINES),
        })
    }
}

enum Wait {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Last `max_lines` non-empty lines of encoder output
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
