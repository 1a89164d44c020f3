use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Channel that carries the left view (red analog in `bgr24` order)
pub const LEFT_CHANNEL: usize = 2;

/// Channel-recombination policy used for a whole run
///
/// Each mode approximates how a color-vision deficiency perceives the
/// anaglyph by suppressing or desaturating specific channels. These are
/// fixed channel policies, not calibrated color transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBlindnessMode {
    /// Left red, right green and blue
    Standard,
    /// Left luma in the red channel, right green and blue
    Protanopia,
    /// Left red, right blue, green suppressed
    Deuteranopia,
    /// Left red, right green, blue suppressed
    Tritanopia,
}

impl ColorBlindnessMode {
    /// Every mode, in display order
    pub const ALL: [ColorBlindnessMode; 4] = [
        Self::Standard,
        Self::Protanopia,
        Self::Deuteranopia,
        Self::Tritanopia,
    ];

    /// The literal accepted on the command line and used in output file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Protanopia => "protanopia",
            Self::Deuteranopia => "deuteranopia",
            Self::Tritanopia => "tritanopia",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "Classic red/cyan anaglyph",
            Self::Protanopia => "Red-blind: grayscale left view in the red channel",
            Self::Deuteranopia => "Green-blind: green channel suppressed",
            Self::Tritanopia => "Blue-blind: blue channel suppressed",
        }
    }

    /// Build one output pixel from the matching left and right pixels
    ///
    /// Channels are in `bgr24` order: `[ch0, ch1, ch2]` with ch2 the red analog.
    #[inline]
    pub fn combine_pixel(&self, left: [u8; 3], right: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Standard => [right[0], right[1], left[LEFT_CHANNEL]],
            Self::Protanopia => [right[0], right[1], luma_bgr(left)],
            Self::Deuteranopia => [right[0], 0, left[LEFT_CHANNEL]],
            Self::Tritanopia => [0, right[1], left[LEFT_CHANNEL]],
        }
    }
}

/// ITU-R BT.601 luma of a `bgr24` pixel, in fixed point with rounding
///
/// Weights: 0.299 R + 0.587 G + 0.114 B.
#[inline]
pub fn luma_bgr(pixel: [u8; 3]) -> u8 {
    let [b, g, r] = pixel;
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

impl fmt::Display for ColorBlindnessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorBlindnessMode {
    type Err = ConfigError;

    /// Exact, case-sensitive match against the four literals
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| ConfigError::UnknownMode { value: s.to_string() })
    }
}
