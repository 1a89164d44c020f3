use std::path::Path;
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::types::{FrameRate, VideoMetadata};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Read the input's video properties with `ffprobe`
///
/// A missing file, a failing probe or an input without a video stream is a
/// source-open error. Zero or unreadable dimensions and frame rates come back
/// as zeros here; [`VideoMetadata::validate`] rejects them.
pub fn probe_video(ffprobe: &str, path: &Path) -> Result<VideoMetadata> {
    let source_error = |reason: String| VideoError::SourceOpen {
        path: path.display().to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(source_error("file does not exist".to_string()).into());
    }

    let output = Command::new(ffprobe)
        .args([
            "-v", "error",
            "-show_entries", "stream=codec_type,width,height,r_frame_rate,avg_frame_rate,nb_frames:format=duration",
            "-of", "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| source_error(format!("failed to run {}: {}", ffprobe, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(source_error(stderr.trim().to_string()).into());
    }

    let json = String::from_utf8_lossy(&output.stdout);
    debug!("ffprobe output for {}: {}", path.display(), json);
    parse_probe_json(&json).map_err(|reason| source_error(reason).into())
}

/// Turn `ffprobe -of json` output into metadata
pub(crate) fn parse_probe_json(json: &str) -> std::result::Result<VideoMetadata, String> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| format!("unreadable ffprobe output: {}", e))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| "no video stream".to_string())?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Prefer the real base rate; fall back to the average for odd containers.
    let frame_rate = [video.r_frame_rate.as_deref(), video.avg_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(|raw| raw.parse::<FrameRate>().ok())
        .find(FrameRate::is_valid)
        .unwrap_or(FrameRate::new(0, 1));

    Ok(VideoMetadata {
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        frame_rate,
        frame_count: video
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        duration: probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok()),
        has_audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_probe() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "codec_type": "video", "width": 64, "height": 48,
                  "r_frame_rate": "10/1", "avg_frame_rate": "10/1", "nb_frames": "20" },
                { "codec_type": "audio", "r_frame_rate": "0/0", "avg_frame_rate": "0/0" }
            ],
            "format": { "duration": "2.000000" }
        }"#;

        let metadata = parse_probe_json(json).unwrap();
        assert_eq!(metadata.width, 64);
        assert_eq!(metadata.height, 48);
        assert_eq!(metadata.frame_rate, FrameRate::new(10, 1));
        assert_eq!(metadata.frame_count, 20);
        assert_eq!(metadata.duration, Some(2.0));
        assert!(metadata.has_audio);
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_parse_falls_back_to_average_rate() {
        let json = r#"{ "streams": [
            { "codec_type": "video", "width": 320, "height": 240,
              "r_frame_rate": "0/0", "avg_frame_rate": "30000/1001" }
        ] }"#;

        let metadata = parse_probe_json(json).unwrap();
        assert_eq!(metadata.frame_rate, FrameRate::new(30000, 1001));
        assert_eq!(metadata.frame_count, 0);
        assert!(!metadata.has_audio);
    }

    #[test]
    fn test_parse_zero_properties_fail_validation() {
        let json = r#"{ "streams": [
            { "codec_type": "video", "width": 0, "height": 240, "r_frame_rate": "0/0" }
        ] }"#;

        let metadata = parse_probe_json(json).unwrap();
        assert!(metadata.validate().is_err());
    }

    #[test]
    fn test_parse_audio_only_input() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        assert!(parse_probe_json(json).is_err());
        assert!(parse_probe_json("not json").is_err());
    }

    #[test]
    fn test_missing_file_is_source_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = probe_video("ffprobe", &dir.path().join("missing.mp4"));
        assert!(matches!(
            result,
            Err(crate::error::ConverterError::Video(VideoError::SourceOpen { .. }))
        ));
    }
}
