use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info};

use crate::config::EncodingConfig;
use crate::error::{Result, VideoError};
use crate::video::process::StderrDrain;
use crate::video::types::{Frame, VideoMetadata};

/// Sequential consumer of output frames
pub trait FrameSink: Send {
    /// Append one frame to the output
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Number of frames accepted so far
    fn frames_written(&self) -> u64;

    /// Flush and close the output; no frames may be written afterwards
    fn finish(&mut self) -> Result<()>;
}

/// Encodes a silent video by piping `bgr24` frames into an ffmpeg child
pub struct FfmpegSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stderr: StderrDrain,
    writer: Option<BufWriter<ChildStdin>>,
    frames_written: u64,
}

impl FfmpegSink {
    /// Start an encoder writing to `path` at the input's size and frame rate
    pub fn create(
        ffmpeg: &str,
        path: &Path,
        metadata: &VideoMetadata,
        encoding: &EncodingConfig,
    ) -> Result<Self> {
        let encoding_error = |reason: String| VideoError::EncodingFailed { reason };

        let mut child = Command::new(ffmpeg)
            .args(["-y", "-v", "error", "-f", "rawvideo", "-pix_fmt", "bgr24"])
            .arg("-s")
            .arg(format!("{}x{}", metadata.width, metadata.height))
            .arg("-r")
            .arg(metadata.frame_rate.to_string())
            .args(["-i", "pipe:0", "-an"])
            .arg("-c:v")
            .arg(&encoding.intermediate_codec)
            .arg("-q:v")
            .arg(encoding.intermediate_quality.to_string())
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| encoding_error(format!("failed to start {}: {}", ffmpeg, e)))?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(encoding_error("encoder stdin unavailable".to_string()).into());
            }
        };

        let stderr = StderrDrain::spawn(child.stderr.take());

        info!(
            "Writing silent video to {} ({}, q={})",
            path.display(),
            encoding.intermediate_codec,
            encoding.intermediate_quality
        );

        Ok(Self {
            path: path.to_path_buf(),
            width: metadata.width,
            height: metadata.height,
            child,
            stderr,
            writer: Some(BufWriter::with_capacity(1 << 20, stdin)),
            frames_written: 0,
        })
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(VideoError::EncodingFailed {
                reason: format!(
                    "frame is {:?}, encoder expects {}x{}",
                    frame.dimensions(),
                    self.width,
                    self.height
                ),
            }
            .into());
        }

        let writer = self.writer.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "encoder already finished".to_string(),
        })?;

        if let Err(e) = writer.write_all(frame.as_raw()) {
            // A broken pipe means the encoder died; its stderr says why.
            self.writer = None;
            let _ = self.child.wait();
            let stderr = self.stderr.collect();
            return Err(VideoError::EncodingFailed {
                reason: format!("writing frame {}: {} {}", self.frames_written, e, stderr),
            }
            .into());
        }

        self.frames_written += 1;
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn finish(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        let flushed = writer.flush();
        // Dropping stdin signals end of input to the encoder.
        drop(writer);

        let status = self.child.wait().map_err(|e| VideoError::EncodingFailed {
            reason: format!("waiting for encoder: {}", e),
        })?;

        if !status.success() {
            let stderr = self.stderr.collect();
            return Err(VideoError::EncodingFailed {
                reason: format!("encoder exited with {}: {}", status, stderr),
            }
            .into());
        }

        flushed.map_err(|e| VideoError::EncodingFailed {
            reason: format!("flushing frames: {}", e),
        })?;

        debug!("Encoder closed {} after {} frames", self.path.display(), self.frames_written);
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            // Never finished: abandon the partial output.
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
