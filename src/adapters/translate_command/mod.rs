// Translation adapters - external command and identity

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::TranslationError;
use crate::ports::TranslatorPort;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Translator that pipes caption text through a configured command
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTranslator {
    /// Create new command translator; `{source_lang}` and `{target_lang}` in args are substituted
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Kill the command when one caption takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_command(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                a.replace("{source_lang}", source_language)
                    .replace("{target_lang}", target_language)
            })
            .collect();

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TranslationError::Failed(format!("failed to run {}: {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await.map_err(|e| {
                TranslationError::Failed(format!("writing to {}: {}", self.program, e))
            })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TranslationError::Failed(format!("{} failed: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(TranslationError::Failed(format!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResult);
        }
        Ok(translated)
    }
}

#[async_trait]
impl TranslatorPort for CommandTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        // Dropping the pending future kills the child
        let translated = tokio::select! {
            result = self.run_command(text, source_language, target_language) => result?,
            _ = tokio::time::sleep(self.timeout) => {
                warn!("{} timed out after {:?}", self.program, self.timeout);
                return Err(TranslationError::Timeout(self.timeout.as_secs()));
            }
            _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
        };
        debug!("Translated '{}' -> '{}'", text, translated);
        Ok(translated)
    }
}

/// Translator that returns its input, for single-language runs
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

#[async_trait]
impl TranslatorPort for IdentityTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        _target_language: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> CommandTranslator {
        CommandTranslator::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_identity_translator() {
        let out = IdentityTranslator
            .translate("ciao", "it", "en", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "ciao");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_translator_pipes_text() {
        let translator = CommandTranslator::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf '[%s>%s] ' \"$1\" \"$2\"; tr a-z A-Z".to_string(),
                "sh".to_string(),
                "{source_lang}".to_string(),
                "{target_lang}".to_string(),
            ],
        );
        let out = translator
            .translate("ciao", "it", "en", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out, "[it>en] CIAO");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let result = sh("cat > /dev/null")
            .translate("ciao", "it", "en", &CancellationToken::new())
            .await;
        assert_eq!(result, Err(TranslationError::EmptyResult));
        assert!(!TranslationError::EmptyResult.is_transient());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_a_transient_error() {
        let result = sh("exit 7")
            .translate("ciao", "it", "en", &CancellationToken::new())
            .await;
        assert!(matches!(&result, Err(TranslationError::Failed(_))));
        assert!(result.unwrap_err().is_transient());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_command_times_out() {
        let translator = sh("sleep 30").with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let result = translator
            .translate("ciao", "it", "en", &CancellationToken::new())
            .await;
        assert_eq!(result, Err(TranslationError::Timeout(0)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_stops_running_command() {
        let translator = sh("sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = translator.translate("ciao", "it", "en", &cancel).await;
        assert_eq!(result, Err(TranslationError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
