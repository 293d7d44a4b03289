// TOML config adapter - Configuration hierarchy: defaults < file < environment

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ConfigError, PipelineConfig};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "bisub.toml";

/// Environment variables that override config fields
pub const ENV_KEYS: &[&str] = &[
    "BISUB_FFMPEG",
    "BISUB_FFPROBE",
    "BISUB_PRESET",
    "BISUB_CRF",
    "BISUB_REQUIRE_BURN_IN",
    "BISUB_MAX_JOBS",
    "BISUB_MAX_NETWORK_CALLS",
    "BISUB_MAX_CHARS_PER_LINE",
    "BISUB_MIN_DURATION",
    "BISUB_TRANSCRIBE_PROGRAM",
    "BISUB_TRANSLATE_PROGRAM",
    "BISUB_SCRATCH_DIR",
    "BISUB_KEEP_ARTIFACTS",
];

fn apply_env(config: &mut PipelineConfig, key: &str, value: &str) -> Result<(), String> {
    match key {
        "BISUB_FFMPEG" => config.encoder.ffmpeg_path = value.to_string(),
        "BISUB_FFPROBE" => config.encoder.ffprobe_path = value.to_string(),
        "BISUB_PRESET" => config.encoder.preset = value.to_string(),
        "BISUB_CRF" => config.encoder.crf = parse(value)?,
        "BISUB_REQUIRE_BURN_IN" => config.encoder.require_burn_in = parse(value)?,
        "BISUB_MAX_JOBS" => config.concurrency.max_jobs = Some(parse(value)?),
        "BISUB_MAX_NETWORK_CALLS" => config.concurrency.max_network_calls = parse(value)?,
        "BISUB_MAX_CHARS_PER_LINE" => config.segmentation.max_chars_per_line = parse(value)?,
        "BISUB_MIN_DURATION" => config.segmentation.min_duration_seconds = parse(value)?,
        "BISUB_TRANSCRIBE_PROGRAM" => config.transcription.program = value.to_string(),
        "BISUB_TRANSLATE_PROGRAM" => config.translation.program = Some(value.to_string()),
        "BISUB_SCRATCH_DIR" => config.scratch.root = PathBuf::from(value),
        "BISUB_KEEP_ARTIFACTS" => config.scratch.keep_artifacts = parse(value)?,
        other => return Err(format!("unknown environment key {}", other)),
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| e.to_string())
}

/// Loads [`PipelineConfig`] from TOML and the environment
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// Load configuration using the process environment
    pub fn load(explicit_path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an injectable environment lookup
    pub fn load_with_env(
        explicit_path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PipelineConfig, ConfigError> {
        let mut config = match Self::config_file(explicit_path) {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                PipelineConfig::default()
            }
        };

        let mut env_overrides = 0;
        for &key in ENV_KEYS {
            if let Some(value) = env(key) {
                apply_env(&mut config, key, &value).map_err(|message| ConfigError::Invalid {
                    key: key.to_string(),
                    message,
                })?;
                debug!("Environment override: {} = {}", key, value);
                env_overrides += 1;
            }
        }
        if env_overrides > 0 {
            info!("Applied {} environment variable overrides", env_overrides);
        }

        Ok(config)
    }

    /// Parse one TOML file; missing sections and keys keep their defaults
    pub fn from_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<PipelineConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    fn config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
        match explicit_path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = TomlConfigLoader::from_toml_str(
            r##"
            [segmentation]
            max_chars_per_line = 30

            [styles.translation]
            font_name = "Noto Sans"
            font_size_pt = 40
            color = "#00FF00"

            [retry]
            max_attempts = 2
            "##,
        )
        .unwrap();
        assert_eq!(config.segmentation.max_chars_per_line, 30);
        assert_eq!(config.segmentation.min_duration_seconds, 0.8);
        assert_eq!(config.styles.translation.font_name, "Noto Sans");
        assert_eq!(config.styles.translation.color.g, 0xFF);
        assert_eq!(config.styles.source.font_size_pt, 44);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.encoder.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_bad_colour_is_a_parse_error() {
        let err = TomlConfigLoader::from_toml_str(
            "[styles.source]\nfont_name = \"Inter\"\nfont_size_pt = 40\ncolor = \"red\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bisub.toml");
        std::fs::write(&path, "[encoder]\ncrf = 18\npreset = \"slow\"\n").unwrap();

        let env: HashMap<&str, &str> = [("BISUB_CRF", "23"), ("BISUB_MAX_JOBS", "3")]
            .into_iter()
            .collect();
        let config = TomlConfigLoader::load_with_env(Some(&path), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.encoder.crf, 23);
        assert_eq!(config.encoder.preset, "slow");
        assert_eq!(config.concurrency.max_jobs, Some(3));
    }

    #[test]
    fn test_bad_environment_value() {
        let err = TomlConfigLoader::load_with_env(None, |k| {
            (k == "BISUB_MAX_JOBS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "BISUB_MAX_JOBS"));
    }

    #[test]
    fn test_missing_explicit_file_is_read_error() {
        let err = TomlConfigLoader::load_with_env(Some(Path::new("/no/such/bisub.toml")), |_| None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
