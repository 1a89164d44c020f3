//! # Audio Module
//!
//! Re-attaches the original audio track to the silent anaglyph video.

pub mod remuxer;

pub use remuxer::{FfmpegRemuxer, Remuxer};
