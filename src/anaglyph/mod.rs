//! # Anaglyph Module
//!
//! The per-frame transform: stereo synthesis by circular horizontal shift,
//! then channel recombination under a color-blindness policy.

pub mod mode;
pub mod recombine;
pub mod stereo;

pub use mode::{luma_bgr, ColorBlindnessMode};
pub use recombine::{recombine, recombine_pair};
pub use stereo::{StereoSynthesizer, DEFAULT_SHIFT};

use crate::{error::Result, video::types::Frame};

/// Run the full per-frame transform: synthesize, then recombine
pub fn anaglyph_frame(
    frame: &Frame,
    synthesizer: &StereoSynthesizer,
    mode: ColorBlindnessMode,
) -> Result<Frame> {
    let pair = synthesizer.synthesize(frame);
    recombine_pair(&pair, mode)
}
