//! # Anaglyph Converter
//!
//! Turn ordinary 2D videos into red/cyan anaglyph 3D videos, with channel
//! policies tuned for common forms of color blindness.
//!
//! Each frame is split into a left and a right viewpoint by a circular
//! horizontal shift, then the two views are recombined channel by channel
//! into one anaglyph frame. The original audio track is muxed back in at the
//! end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anaglyph_converter::{AnaglyphConverter, ColorBlindnessMode, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let converter = AnaglyphConverter::new(Config::default())?;
//! let report = converter
//!     .convert("test_video.mp4", ColorBlindnessMode::Deuteranopia)
//!     .await?;
//!
//! println!("Saved {} frames to {:?}", report.frames_written, report.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`anaglyph`] - Stereo synthesis and channel recombination
//! - [`video`] - Frames, metadata probing, ffmpeg frame source and sink
//! - [`audio`] - Re-attaching the original audio track
//! - [`conversion`] - Output naming, frame loop and the conversion engine
//! - [`config`] - Configuration management
//!
//! ## Transforming Single Frames
//!
//! The per-frame transform is a pure function and needs no ffmpeg:
//!
//! ```rust
//! use anaglyph_converter::anaglyph::{anaglyph_frame, StereoSynthesizer};
//! use anaglyph_converter::{ColorBlindnessMode, Frame};
//!
//! let frame = Frame::new_filled(64, 48, [10, 220, 30]);
//! let output = anaglyph_frame(&frame, &StereoSynthesizer::default(), ColorBlindnessMode::Tritanopia)?;
//! assert_eq!(output.get_pixel(0, 0), [0, 220, 30]);
//! # Ok::<(), anaglyph_converter::ConverterError>(())
//! ```

pub mod anaglyph;
pub mod audio;
pub mod config;
pub mod conversion;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    anaglyph::ColorBlindnessMode,
    audio::Remuxer,
    config::Config,
    conversion::{AnaglyphConverter, ConversionReport},
    error::{ConverterError, Result},
    video::Frame,
};
