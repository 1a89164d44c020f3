use std::io::ErrorKind;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    anaglyph::DEFAULT_SHIFT,
    error::{ConfigError, ConverterError, Result},
};

/// Main configuration for the anaglyph converter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stereo synthesis settings
    pub stereo: StereoConfig,

    /// Intermediate and final encoding settings
    pub encoding: EncodingConfig,

    /// Frame processing settings
    pub processing: ProcessingConfig,

    /// External tool settings
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound { path: path.display().to_string() }.into(),
            _ => ConverterError::Io(e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.encoding.validate()?;
        self.processing.validate()?;
        self.tools.validate()?;
        Ok(())
    }
}

/// Stereo synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    /// Horizontal disparity between the two synthesized views, in pixels
    pub shift: u32,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self { shift: DEFAULT_SHIFT }
    }
}

/// Encoding configuration for the silent intermediate and the final deliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Container extension of the silent intermediate video
    pub intermediate_extension: String,

    /// FFmpeg encoder used for the intermediate video stream
    pub intermediate_codec: String,

    /// FFmpeg `-q:v` value for the intermediate (1 = best, 31 = worst)
    pub intermediate_quality: u8,

    /// Container extension of the final deliverable
    pub output_extension: String,

    /// FFmpeg encoder used for the audio track of the deliverable
    pub audio_codec: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            intermediate_extension: "avi".to_string(),
            intermediate_codec: "mjpeg".to_string(),
            intermediate_quality: 2,
            output_extension: "mp4".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl EncodingConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("encoding.intermediate_extension", &self.intermediate_extension),
            ("encoding.intermediate_codec", &self.intermediate_codec),
            ("encoding.output_extension", &self.output_extension),
            ("encoding.audio_codec", &self.audio_codec),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }.into());
            }
        }

        if !(1..=31).contains(&self.intermediate_quality) {
            return Err(ConfigError::InvalidValue {
                key: "encoding.intermediate_quality".to_string(),
                value: self.intermediate_quality.to_string()
            }.into());
        }

        // The intermediate and the deliverable share a directory and base name.
        if self.intermediate_extension == self.output_extension {
            return Err(ConfigError::InvalidValue {
                key: "encoding.intermediate_extension".to_string(),
                value: format!("{} (same as output_extension)", self.intermediate_extension)
            }.into());
        }

        Ok(())
    }
}

/// Frame processing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads used to recombine rows in parallel
    pub threads: usize,

    /// Frames between progress log lines
    pub progress_interval: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            progress_interval: 100,
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        if self.progress_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.progress_interval".to_string(),
                value: self.progress_interval.to_string()
            }.into());
        }

        Ok(())
    }
}

/// External tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path or name of the ffmpeg binary
    pub ffmpeg: String,

    /// Path or name of the ffprobe binary
    pub ffprobe: String,

    /// Upper bound on the audio remux run, in seconds
    pub remux_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            remux_timeout_secs: 600,
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg.trim().is_empty() || self.ffprobe.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools".to_string(),
                value: format!("ffmpeg='{}', ffprobe='{}'", self.ffmpeg, self.ffprobe)
            }.into());
        }

        if self.remux_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tools.remux_timeout_secs".to_string(),
                value: self.remux_timeout_secs.to_string()
            }.into());
        }

        Ok(())
    }
}
