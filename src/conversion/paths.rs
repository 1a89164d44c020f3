use std::path::{Path, PathBuf};

use tracing::warn;

use crate::anaglyph::ColorBlindnessMode;
use crate::config::EncodingConfig;
use crate::error::{Result, VideoError};

/// Files produced by one conversion, next to the input
///
/// For input `dir/B.ext` and mode `M`: the silent intermediate is
/// `dir/B_M_video.<intermediate ext>` and the deliverable is
/// `dir/B_M.<output ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub intermediate: PathBuf,
    pub output: PathBuf,
}

impl OutputPaths {
    pub fn for_input(input: &Path, mode: ColorBlindnessMode, encoding: &EncodingConfig) -> Result<Self> {
        let base = input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| VideoError::SourceOpen {
                path: input.display().to_string(),
                reason: "input path has no usable file name".to_string(),
            })?;

        let dir = input.parent().unwrap_or_else(|| Path::new(""));

        Ok(Self {
            intermediate: dir.join(format!(
                "{}_{}_video.{}",
                base,
                mode.name(),
                encoding.intermediate_extension
            )),
            output: dir.join(format!("{}_{}.{}", base, mode.name(), encoding.output_extension)),
        })
    }
}

/// Owns the silent intermediate file and deletes it when dropped
///
/// Created as soon as the encoder exists, so the file is removed on every
/// exit path from then on, whether or not the remux succeeds.
#[derive(Debug)]
pub struct IntermediateFile {
    path: PathBuf,
}

impl IntermediateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IntermediateFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove intermediate video {}: {}", self.path.display(), e),
        }
    }
}
