use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use rayon::ThreadPool;
use tokio::task;
use tracing::{debug, info, warn};

use crate::{
    anaglyph::{ColorBlindnessMode, StereoSynthesizer},
    audio::{FfmpegRemuxer, Remuxer},
    config::Config,
    conversion::paths::{IntermediateFile, OutputPaths},
    conversion::pipeline::drive_frames,
    error::{ConfigError, Result, VideoError},
    video::{FfmpegSink, FfmpegSource, FrameSink, FrameSource, VideoMetadata},
};

/// Outcome of a successful conversion
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Final deliverable with the original audio
    pub output_path: PathBuf,

    /// Frames written to the silent intermediate
    pub frames_written: u64,

    /// Input properties the run was driven by
    pub metadata: VideoMetadata,
}

/// Converts 2D videos into anaglyph 3D videos
///
/// The engine follows a fixed pipeline:
/// 1. Name outputs - derive intermediate and final paths from the input
/// 2. Open source - probe and validate the input, start the decoder
/// 3. Render - synthesize, recombine and encode every frame, in order
/// 4. Remux - attach the input's audio, then delete the intermediate
pub struct AnaglyphConverter<R: Remuxer = FfmpegRemuxer> {
    config: Config,
    synthesizer: StereoSynthesizer,
    pool: Arc<ThreadPool>,
    remuxer: R,
}

impl AnaglyphConverter<FfmpegRemuxer> {
    /// Create a converter that muxes audio with ffmpeg
    pub fn new(config: Config) -> Result<Self> {
        let remuxer = FfmpegRemuxer::from_config(&config.tools, &config.encoding);
        Self::with_remuxer(config, remuxer)
    }
}

impl<R: Remuxer> AnaglyphConverter<R> {
    /// Create a converter with a custom audio remuxer
    pub fn with_remuxer(config: Config, remuxer: R) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.processing.threads)
            .thread_name(|i| format!("anaglyph-worker-{}", i))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "processing.threads".to_string(),
                value: format!("{} ({})", config.processing.threads, e),
            })?;

        debug!("Recombining rows on {} worker threads", config.processing.threads);

        Ok(Self {
            synthesizer: StereoSynthesizer::new(config.stereo.shift),
            pool: Arc::new(pool),
            config,
            remuxer,
        })
    }

    /// Check that the configured ffmpeg and ffprobe binaries can be run
    pub fn check_ffmpeg_available(&self) -> bool {
        [&self.config.tools.ffmpeg, &self.config.tools.ffprobe]
            .into_iter()
            .all(|tool| {
                Command::new(tool)
                    .arg("-version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|status| status.success())
                    .unwrap_or(false)
            })
    }

    /// Convert `input` using a mode given by name
    ///
    /// The name is checked before the input is touched, so an unknown mode
    /// fails with a configuration error even for unreadable inputs.
    pub async fn convert_named<P: AsRef<Path>>(&self, input: P, mode: &str) -> Result<ConversionReport> {
        let mode: ColorBlindnessMode = mode.parse()?;
        self.convert(input, mode).await
    }

    /// Convert `input` into an anaglyph video with its original audio
    pub async fn convert<P: AsRef<Path>>(&self, input: P, mode: ColorBlindnessMode) -> Result<ConversionReport> {
        let input = input.as_ref();
        let paths = OutputPaths::for_input(input, mode, &self.config.encoding)?;

        info!("Converting {} ({} mode, shift {}px)", input.display(), mode, self.synthesizer.shift());

        let tools = &self.config.tools;
        let source = FfmpegSource::open(&tools.ffmpeg, &tools.ffprobe, input)?;
        let metadata = source.metadata().clone();

        if !metadata.has_audio {
            warn!("{} has no audio stream; remuxing will fail", input.display());
        }

        let sink = FfmpegSink::create(&tools.ffmpeg, &paths.intermediate, &metadata, &self.config.encoding)?;
        let intermediate = IntermediateFile::new(paths.intermediate.clone());

        info!("Processing video for {}...", mode);
        let frames_written = self.render(source, sink, mode).await?;

        if metadata.frame_count > 0 && frames_written != metadata.frame_count {
            warn!(
                "Container reported {} frames but {} were decoded",
                metadata.frame_count, frames_written
            );
        }

        info!("Anaglyph video processing complete ({} frames). Adding audio...", frames_written);
        self.attach_audio(intermediate, input, &paths.output).await?;

        info!("Final video with audio saved at: {}", paths.output.display());
        Ok(ConversionReport {
            output_path: paths.output,
            frames_written,
            metadata,
        })
    }

    /// Drive the frame loop on a blocking worker, then close the sink
    pub async fn render<S, K>(&self, mut source: S, mut sink: K, mode: ColorBlindnessMode) -> Result<u64>
    where
        S: FrameSource + 'static,
        K: FrameSink + 'static,
    {
        let pool = Arc::clone(&self.pool);
        let synthesizer = self.synthesizer;
        let progress_interval = self.config.processing.progress_interval;

        task::spawn_blocking(move || -> Result<u64> {
            let written = pool.install(|| {
                drive_frames(&mut source, &mut sink, &synthesizer, mode, progress_interval)
            })?;
            sink.finish()?;
            Ok(written)
        })
        .await
        .map_err(|e| VideoError::FrameProcessingFailed {
            reason: format!("frame worker stopped: {}", e),
        })?
    }

    /// Mux audio into `output`, then delete the intermediate whatever the outcome
    pub(crate) async fn attach_audio(
        &self,
        intermediate: IntermediateFile,
        audio_source: &Path,
        output: &Path,
    ) -> Result<()> {
        let result = self.remuxer.remux(intermediate.path(), audio_source, output).await;
        drop(intermediate);

        if let Err(e) = &result {
            warn!("Error during audio remux: {}", e);
            if output.exists() {
                if let Err(remove_err) = std::fs::remove_file(output) {
                    warn!("Failed to remove incomplete output {}: {}", output.display(), remove_err);
                }
            }
        }
        result
    }
}
