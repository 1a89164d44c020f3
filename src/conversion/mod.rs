//! # Conversion Module
//!
//! Output naming, the strict-order frame loop, and the engine that runs a
//! whole conversion from input file to muxed deliverable.

pub mod engine;
pub mod paths;
pub mod pipeline;

pub use engine::{AnaglyphConverter, ConversionReport};
pub use paths::{IntermediateFile, OutputPaths};
pub use pipeline::drive_frames;
