use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::adapters::{
    CommandTranscriber, CommandTranslator, FfmpegEncoder, FfprobeProbe, IdentityTranslator,
};
use crate::app::{batch_interactor::BatchInteractor, pipeline_interactor::PipelineInteractor};
use crate::config::PipelineConfig;
use crate::engine::{ArtifactPolicy, Muxer};
use crate::ports::{EncoderPort, ProbePort, TranscriptionPort, TranslatorPort};
use crate::subtitles::SubtitleRenderer;

pub trait AppContainer: Send + Sync {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn probe_port(&self) -> Arc<dyn ProbePort>;
    fn config(&self) -> Arc<PipelineConfig>;
}

pub struct DefaultAppContainer {
    config: Arc<PipelineConfig>,
    probe_port: Arc<dyn ProbePort>,
    pipeline_interactor: Arc<PipelineInteractor>,
    batch_interactor: Arc<BatchInteractor>,
}

impl DefaultAppContainer {
    /// Wire the production adapters described by `config`
    pub fn new(config: PipelineConfig) -> Self {
        let probe_port = Arc::new(FfprobeProbe::new(config.encoder.ffprobe_path.clone()));
        let transcription_port = Arc::new(CommandTranscriber::new(config.transcription.clone()));
        let translator_port: Arc<dyn TranslatorPort> = match &config.translation.program {
            Some(program) => Arc::new(
                CommandTranslator::new(program.clone(), config.translation.args.clone())
                    .with_timeout(config.translation.timeout()),
            ),
            None => Arc::new(IdentityTranslator),
        };
        let encoder_port = Arc::new(FfmpegEncoder::new(config.encoder.ffmpeg_path.clone()));

        Self::with_ports(
            config,
            probe_port as Arc<dyn ProbePort>,
            transcription_port as Arc<dyn TranscriptionPort>,
            translator_port,
            encoder_port as Arc<dyn EncoderPort>,
        )
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        config: PipelineConfig,
        probe_port: Arc<dyn ProbePort>,
        transcription_port: Arc<dyn TranscriptionPort>,
        translator_port: Arc<dyn TranslatorPort>,
        encoder_port: Arc<dyn EncoderPort>,
    ) -> Self {
        let config = Arc::new(config);
        let muxer = Arc::new(Muxer::new(
            encoder_port,
            SubtitleRenderer::new(config.layout.clone()),
            config.encoder.clone(),
            ArtifactPolicy {
                keep_on_success: config.scratch.keep_artifacts,
                keep_on_failure: config.scratch.retain_on_failure,
            },
        ));
        let network = Arc::new(Semaphore::new(config.concurrency.max_network_calls.max(1)));

        let pipeline_interactor = Arc::new(PipelineInteractor::new(
            Arc::clone(&probe_port),
            transcription_port,
            translator_port,
            muxer,
            Arc::clone(&config),
            network,
        ));
        let batch_interactor = Arc::new(BatchInteractor::new(
            Arc::clone(&pipeline_interactor),
            config.concurrency.effective_max_jobs(),
        ));

        Self {
            config,
            probe_port,
            pipeline_interactor,
            batch_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline_interactor(&self) -> Arc<PipelineInteractor> {
        Arc::clone(&self.pipeline_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn probe_port(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn config(&self) -> Arc<PipelineConfig> {
        Arc::clone(&self.config)
    }
}
