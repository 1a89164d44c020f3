use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::{EncodingConfig, ToolsConfig};
use crate::error::{RemuxError, Result};

/// Combines a silent video with another file's audio track
///
/// The conversion engine only sees this capability, so muxing can be swapped
/// out or faked in tests.
pub trait Remuxer: Send + Sync {
    /// Copy `video`'s picture, take `audio_source`'s first audio track, write `output`
    fn remux(
        &self,
        video: &Path,
        audio_source: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Remuxer that shells out to `ffmpeg`
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg: String,
    audio_codec: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new<S: Into<String>>(ffmpeg: S, audio_codec: S, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            audio_codec: audio_codec.into(),
            timeout,
        }
    }

    pub fn from_config(tools: &ToolsConfig, encoding: &EncodingConfig) -> Self {
        Self::new(
            tools.ffmpeg.clone(),
            encoding.audio_codec.clone(),
            Duration::from_secs(tools.remux_timeout_secs),
        )
    }

    /// Arguments for one remux run, in ffmpeg's order
    pub fn arguments(&self, video: &Path, audio_source: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            video.display().to_string(),
            "-i".to_string(),
            audio_source.display().to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            output.display().to_string(),
        ]
    }
}

impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, video: &Path, audio_source: &Path, output: &Path) -> Result<()> {
        let args = self.arguments(video, audio_source, output);
        debug!("Running {} {}", self.ffmpeg, args.join(" "));

        let child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RemuxError::SpawnFailed {
                tool: self.ffmpeg.clone(),
                reason: e.to_string(),
            })?;

        let output_result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RemuxError::TimedOut { secs: self.timeout.as_secs() })?
            .map_err(|e| RemuxError::SpawnFailed {
                tool: self.ffmpeg.clone(),
                reason: e.to_string(),
            })?;

        if !output_result.status.success() {
            let stderr = String::from_utf8_lossy(&output_result.stderr);
            return Err(RemuxError::ToolFailed {
                status: output_result.status.to_string(),
                stderr: stderr.trim().to_string(),
            }
            .into());
        }

        info!("Muxed audio from {} into {}", audio_source.display(), output.display());
        Ok(())
    }
}
