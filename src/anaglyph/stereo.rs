use crate::video::types::{Frame, StereoPair, CHANNELS};

/// Default horizontal disparity between the synthesized views, in pixels
pub const DEFAULT_SHIFT: u32 = 10;

/// Synthesizes a left and right viewpoint from one monoscopic frame
///
/// Each view is the source with every row circularly shifted: left by
/// `shift` pixels for the left eye, right by `shift` pixels for the right
/// eye. Content pushed past one edge reappears at the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoSynthesizer {
    shift: u32,
}

impl StereoSynthesizer {
    pub fn new(shift: u32) -> Self {
        Self { shift }
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Produce the stereo pair for `frame`
    ///
    /// Left column `c` holds source column `(c + shift) mod width`; right
    /// column `c` holds source column `(c - shift) mod width`. Widths at or
    /// below the shift still wrap arithmetically.
    pub fn synthesize(&self, frame: &Frame) -> StereoPair {
        StereoPair {
            left: shift_rows(frame, ShiftDirection::Left, self.shift),
            right: shift_rows(frame, ShiftDirection::Right, self.shift),
        }
    }
}

impl Default for StereoSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SHIFT)
    }
}

#[derive(Debug, Clone, Copy)]
enum ShiftDirection {
    Left,
    Right,
}

fn shift_rows(frame: &Frame, direction: ShiftDirection, shift: u32) -> Frame {
    let mut shifted = frame.clone();
    let width = frame.width() as usize;
    if width == 0 {
        return shifted;
    }

    let offset = (shift as usize % width) * CHANNELS;
    let stride = frame.row_stride();
    for row in shifted.as_raw_mut().chunks_exact_mut(stride) {
        match direction {
            ShiftDirection::Left => row.rotate_left(offset),
            ShiftDirection::Right => row.rotate_right(offset),
        }
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every pixel encodes its own coordinates so moves are traceable
    fn coordinate_frame(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| [x as u8, y as u8, (x + y) as u8])
    }

    #[test]
    fn test_shift_correctness() {
        let (width, height) = (37, 5);
        let source = coordinate_frame(width, height);
        let pair = StereoSynthesizer::default().synthesize(&source);

        for y in 0..height {
            for c in 0..width {
                let left_src = (c + 10) % width;
                let right_src = (c + width - 10) % width;
                assert_eq!(pair.left.get_pixel(c, y), source.get_pixel(left_src, y));
                assert_eq!(pair.right.get_pixel(c, y), source.get_pixel(right_src, y));
            }
        }
    }

    #[test]
    fn test_dimensions_preserved() {
        let source = coordinate_frame(64, 48);
        let pair = StereoSynthesizer::default().synthesize(&source);
        assert_eq!(pair.left.dimensions(), (64, 48));
        assert_eq!(pair.right.dimensions(), (64, 48));
    }

    #[test]
    fn test_narrow_frame_wraps() {
        // width 3, shift 10 -> effective shift of 1
        let source = coordinate_frame(3, 2);
        let pair = StereoSynthesizer::default().synthesize(&source);

        for y in 0..2 {
            for c in 0..3 {
                assert_eq!(pair.left.get_pixel(c, y), source.get_pixel((c + 1) % 3, y));
                assert_eq!(pair.right.get_pixel(c, y), source.get_pixel((c + 2) % 3, y));
            }
        }

        // width equal to the shift is a full rotation
        let source = coordinate_frame(10, 1);
        let pair = StereoSynthesizer::default().synthesize(&source);
        assert_eq!(pair.left, source);
        assert_eq!(pair.right, source);
    }

    #[test]
    fn test_custom_shift() {
        let source = coordinate_frame(8, 1);
        let pair = StereoSynthesizer::new(3).synthesize(&source);
        assert_eq!(pair.left.get_pixel(0, 0), source.get_pixel(3, 0));
        assert_eq!(pair.right.get_pixel(0, 0), source.get_pixel(5, 0));
    }
}
