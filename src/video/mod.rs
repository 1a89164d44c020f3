//! # Video Module
//!
//! Frame types plus the ffmpeg-backed frame source and frame sink.

pub mod types;
pub mod probe;
pub mod source;
pub mod sink;
mod process;

pub use types::{Frame, FrameRate, StereoPair, VideoMetadata};
pub use probe::probe_video;
pub use source::{FfmpegSource, FrameSource};
pub use sink::{FfmpegSink, FrameSink};
