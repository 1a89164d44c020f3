use thiserror::Error;

/// Main error type for the anaglyph converter
#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Audio remux error: {0}")]
    Remux(#[from] RemuxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are detected before the input video is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown color blindness mode: '{value}' (expected one of: standard, protanopia, deuteranopia, tritanopia)")]
    UnknownMode { value: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot open video source {path}: {reason}")]
    SourceOpen { path: String, reason: String },

    #[error("Video properties could not be read: {details}")]
    InvalidMetadata { details: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },
}

/// Errors from the external muxing tool
#[derive(Error, Debug)]
pub enum RemuxError {
    #[error("Failed to launch {tool}: {reason}")]
    SpawnFailed { tool: String, reason: String },

    #[error("Muxing tool exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("Muxing tool did not finish within {secs}s")]
    TimedOut { secs: u64 },
}

/// Convenience type alias for Results using ConverterError
pub type Result<T> = std::result::Result<T, ConverterError>;

impl ConverterError {
    /// True for errors raised before any frame was read
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::UnknownMode { value }) => {
                format!(
                    "'{}' is not a supported mode. Use one of: standard, protanopia, deuteranopia, tritanopia.",
                    value
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Video(VideoError::SourceOpen { path, .. }) => {
                format!("Could not open video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::InvalidMetadata { .. }) => {
                "The video's width, height or frame rate could not be read.".to_string()
            }
            Self::Remux(RemuxError::SpawnFailed { tool, .. }) => {
                format!("Could not run '{}'. Please install FFmpeg and make sure it is on your PATH.", tool)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mode_is_configuration_error() {
        let err: ConverterError = ConfigError::UnknownMode { value: "Standard".to_string() }.into();
        assert!(err.is_configuration());
        assert!(err.user_message().contains("Standard"));
    }

    #[test]
    fn test_remux_error_keeps_diagnostics() {
        let err: ConverterError = RemuxError::ToolFailed {
            status: "exit status: 1".to_string(),
            stderr: "Stream map '1:a:0' matches no streams.".to_string(),
        }
        .into();
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("matches no streams"));
    }
}
