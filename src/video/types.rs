use std::fmt;
use std::str::FromStr;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{Result, VideoError};

/// Number of 8-bit channels per pixel
pub const CHANNELS: usize = 3;

/// Represents a single video frame
///
/// Pixels are stored as three 8-bit channels in decoder order. The pipeline
/// decodes to `bgr24`, so channel 2 is red and channels 0-1 form its cyan
/// complement. The `image` buffer is only used as a packed 3-channel store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame with the given dimensions filled with zeros
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame filled with a single pixel value
    pub fn new_filled(width: u32, height: u32, pixel: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(pixel));
        Self { buffer }
    }

    /// Create a frame whose pixels are computed from their coordinates
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 3],
    {
        let buffer = ImageBuffer::from_fn(width, height, |x, y| Rgb(f(x, y)));
        Self { buffer }
    }

    /// Create a frame from packed raw bytes
    ///
    /// Returns `None` if `data` is not exactly `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != frame_size(width, height) {
            return None;
        }
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get the channels of the pixel at the given coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Packed bytes, row-major, three channels per pixel
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Bytes in one row of pixels
    pub fn row_stride(&self) -> usize {
        self.width() as usize * CHANNELS
    }
}

/// Byte size of one packed frame
pub fn frame_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

/// Left and right views synthesized from one source frame
#[derive(Clone, Debug)]
pub struct StereoPair {
    pub left: Frame,
    pub right: Frame,
}

/// Exact rational frame rate as reported by the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// A rate with a zero numerator or denominator cannot drive an encoder
    pub fn is_valid(&self) -> bool {
        self.num != 0 && self.den != 0
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = VideoError;

    /// Parse `"30000/1001"` or a plain integer such as `"25"`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || VideoError::InvalidMetadata {
            details: format!("unreadable frame rate '{}'", s),
        };

        match s.split_once('/') {
            Some((num, den)) => Ok(Self::new(
                num.trim().parse().map_err(|_| invalid())?,
                den.trim().parse().map_err(|_| invalid())?,
            )),
            None => Ok(Self::new(s.parse().map_err(|_| invalid())?, 1)),
        }
    }
}

/// Properties of the input video, read once before processing
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Container-reported frame count; 0 when the container does not say
    pub frame_count: u64,
    pub duration: Option<f64>,
    pub has_audio: bool,
}

impl VideoMetadata {
    /// Reject metadata that cannot drive the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || !self.frame_rate.is_valid() {
            return Err(VideoError::InvalidMetadata {
                details: format!(
                    "width={}, height={}, frame rate={}",
                    self.width, self.height, self.frame_rate
                ),
            }
            .into());
        }
        Ok(())
    }

    pub fn frame_size(&self) -> usize {
        frame_size(self.width, self.height)
    }
}
