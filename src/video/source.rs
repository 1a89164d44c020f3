use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::probe::probe_video;
use crate::video::process::StderrDrain;
use crate::video::types::{Frame, VideoMetadata};

/// Sequential supplier of decoded frames
pub trait FrameSource: Send {
    /// Properties read before the first frame
    fn metadata(&self) -> &VideoMetadata;

    /// Next frame in decode order, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Decodes a video file by streaming `bgr24` frames out of an ffmpeg child
pub struct FfmpegSource {
    path: PathBuf,
    metadata: VideoMetadata,
    child: Child,
    stderr: StderrDrain,
    reader: BufReader<ChildStdout>,
    frames_read: u64,
    finished: bool,
}

impl FfmpegSource {
    /// Probe `path`, validate its metadata, then start the decoder
    ///
    /// No decoder process is started when the probe or validation fails.
    pub fn open(ffmpeg: &str, ffprobe: &str, path: &Path) -> Result<Self> {
        let metadata = probe_video(ffprobe, path)?;
        metadata.validate()?;

        info!(
            "Video properties - width: {}, height: {}, fps: {:.3} ({}), total frames: {}",
            metadata.width,
            metadata.height,
            metadata.frame_rate.as_f64(),
            metadata.frame_rate,
            metadata.frame_count
        );

        let mut child = Command::new(ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "bgr24", "-an", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::SourceOpen {
                path: path.display().to_string(),
                reason: format!("failed to start {}: {}", ffmpeg, e),
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VideoError::SourceOpen {
                    path: path.display().to_string(),
                    reason: "decoder stdout unavailable".to_string(),
                }
                .into());
            }
        };

        let stderr = StderrDrain::spawn(child.stderr.take());

        debug!("Started decoder for {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            child,
            stderr,
            reader: BufReader::with_capacity(1 << 20, stdout),
            frames_read: 0,
            finished: false,
        })
    }

    /// Reap the decoder once its stdout has closed
    ///
    /// Closed stdout only means end of stream if the decoder exited cleanly.
    /// A decoder that failed before producing any frame could not decode the
    /// input at all; one that failed later cut the stream short.
    fn check_decoder_exit(&mut self) -> Result<()> {
        let status = self.child.wait().map_err(|e| VideoError::DecodingFailed {
            reason: format!("waiting for decoder: {}", e),
        })?;
        let stderr = self.stderr.collect();

        if status.success() {
            if !stderr.is_empty() {
                debug!("Decoder diagnostics: {}", stderr);
            }
            return Ok(());
        }

        if self.frames_read == 0 {
            return Err(VideoError::SourceOpen {
                path: self.path.display().to_string(),
                reason: format!("decoder exited with {}: {}", status, stderr),
            }
            .into());
        }

        Err(VideoError::DecodingFailed {
            reason: format!(
                "decoder exited with {} after {} frames: {}",
                status, self.frames_read, stderr
            ),
        }
        .into())
    }
}

impl FrameSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        let mut data = vec![0u8; self.metadata.frame_size()];
        match read_full_frame(&mut self.reader, &mut data) {
            Ok(FrameRead::Complete) => {
                self.frames_read += 1;
                let frame = Frame::from_raw(self.metadata.width, self.metadata.height, data)
                    .ok_or_else(|| VideoError::DecodingFailed {
                        reason: "decoded frame has the wrong size".to_string(),
                    })?;
                Ok(Some(frame))
            }
            Ok(FrameRead::EndOfStream) => {
                self.finished = true;
                self.check_decoder_exit()?;
                debug!("No more frames to read after {}", self.frames_read);
                Ok(None)
            }
            Ok(FrameRead::Truncated(bytes)) => {
                self.finished = true;
                self.check_decoder_exit()?;
                warn!(
                    "Dropping truncated trailing frame ({} of {} bytes) after frame {}",
                    bytes,
                    self.metadata.frame_size(),
                    self.frames_read
                );
                Ok(None)
            }
            Err(e) => Err(VideoError::DecodingFailed {
                reason: format!("reading frame {}: {}", self.frames_read, e),
            }
            .into()),
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // The decoder may still be blocked writing frames nobody will read.
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

enum FrameRead {
    Complete,
    EndOfStream,
    Truncated(usize),
}

/// Fill `buf` completely, telling a clean end of stream apart from a short read
fn read_full_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<FrameRead> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Ok(if filled == 0 {
                    FrameRead::EndOfStream
                } else {
                    FrameRead::Truncated(filled)
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(FrameRead::Complete)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ConverterError;
    use std::io::Cursor;

    /// Write an executable shell script standing in for ffmpeg or ffprobe
    #[cfg(unix)]
    pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    /// ffprobe stand-in reporting one video stream with the given properties
    #[cfg(unix)]
    pub(crate) fn fake_ffprobe(dir: &Path, width: u32, height: u32, rate: &str) -> String {
        let json = format!(
            r#"{{"streams":[{{"codec_type":"video","width":{},"height":{},"r_frame_rate":"{}"}},{{"codec_type":"audio"}}]}}"#,
            width, height, rate
        );
        fake_tool(dir, "ffprobe", &format!("cat <<'EOF'\n{}\nEOF", json))
    }

    /// ffmpeg stand-in that leaves a marker file behind whenever it runs
    #[cfg(unix)]
    pub(crate) fn marking_ffmpeg(dir: &Path, marker: &Path) -> String {
        fake_tool(dir, "ffmpeg", &format!("touch '{}'", marker.display()))
    }

    #[cfg(unix)]
    fn open_with(tools: &Path, ffmpeg_body: &str) -> Result<FfmpegSource> {
        let input = tools.join("input.mp4");
        std::fs::write(&input, b"container").unwrap();
        let ffprobe = fake_ffprobe(tools, 4, 2, "10/1");
        let ffmpeg = fake_tool(tools, "ffmpeg", ffmpeg_body);
        FfmpegSource::open(&ffmpeg, &ffprobe, &input)
    }

    #[test]
    fn test_read_full_frame_boundaries() {
        let mut reader = Cursor::new(vec![1u8; 10]);
        let mut buf = [0u8; 4];

        assert!(matches!(read_full_frame(&mut reader, &mut buf).unwrap(), FrameRead::Complete));
        assert!(matches!(read_full_frame(&mut reader, &mut buf).unwrap(), FrameRead::Complete));
        assert!(matches!(read_full_frame(&mut reader, &mut buf).unwrap(), FrameRead::Truncated(2)));
        assert!(matches!(read_full_frame(&mut reader, &mut buf).unwrap(), FrameRead::EndOfStream));
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_failure_mid_stream_is_reported() {
        let tools = tempfile::tempdir().unwrap();
        // One 4x2 bgr24 frame, then a crash
        let mut source = open_with(
            tools.path(),
            "head -c 24 /dev/zero; echo 'corrupt packet' >&2; exit 1",
        )
        .unwrap();

        assert!(source.next_frame().unwrap().is_some());
        match source.next_frame() {
            Err(ConverterError::Video(VideoError::DecodingFailed { reason })) => {
                assert!(reason.contains("corrupt packet"), "{}", reason);
                assert!(reason.contains("after 1 frames"), "{}", reason);
            }
            other => panic!("expected a decoding failure, got {:?}", other.map(|f| f.is_some())),
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_decoder_failure_before_first_frame_is_open_error() {
        let tools = tempfile::tempdir().unwrap();
        let mut source = open_with(tools.path(), "echo 'unsupported codec' >&2; exit 1").unwrap();

        match source.next_frame() {
            Err(ConverterError::Video(VideoError::SourceOpen { reason, .. })) => {
                assert!(reason.contains("unsupported codec"), "{}", reason);
            }
            other => panic!("expected a source-open failure, got {:?}", other.map(|f| f.is_some())),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_truncated_frame_after_decoder_failure_is_reported() {
        let tools = tempfile::tempdir().unwrap();
        let mut source = open_with(tools.path(), "head -c 30 /dev/zero; exit 1").unwrap();

        assert!(source.next_frame().unwrap().is_some());
        assert!(matches!(
            source.next_frame(),
            Err(ConverterError::Video(VideoError::DecodingFailed { .. }))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_exit_ends_stream() {
        let tools = tempfile::tempdir().unwrap();
        let mut source = open_with(tools.path(), "head -c 48 /dev/zero; exit 0").unwrap();

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_metadata_starts_no_decoder() {
        let tools = tempfile::tempdir().unwrap();
        let marker = tools.path().join("decoder-started");
        let input = tools.path().join("input.mp4");
        std::fs::write(&input, b"container").unwrap();
        let ffmpeg = marking_ffmpeg(tools.path(), &marker);

        for (width, height, rate) in [(0, 48, "10/1"), (64, 0, "10/1"), (64, 48, "0/0")] {
            let ffprobe = fake_ffprobe(tools.path(), width, height, rate);
            let result = FfmpegSource::open(&ffmpeg, &ffprobe, &input);
            assert!(matches!(
                result,
                Err(ConverterError::Video(VideoError::InvalidMetadata { .. }))
            ));
        }
        assert!(!marker.exists());
    }

    #[test]
    fn test_open_missing_input_starts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegSource::open("ffmpeg", "ffprobe", &dir.path().join("missing.mp4"));
        assert!(matches!(
            result,
            Err(ConverterError::Video(VideoError::SourceOpen { .. }))
        ));
    }
}
