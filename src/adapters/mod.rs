// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod toml_config;
pub mod tracing_log;
pub mod transcribe_command;
pub mod translate_command;

// Re-export adapters
pub use exec_ffmpeg::FfmpegEncoder;
pub use probe_ffprobe::FfprobeProbe;
pub use toml_config::TomlConfigLoader;
pub use tracing_log::init_logging;
pub use transcribe_command::CommandTranscriber;
pub use translate_command::{CommandTranslator, IdentityTranslator};
