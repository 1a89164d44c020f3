use rayon::prelude::*;

use crate::{
    anaglyph::ColorBlindnessMode,
    error::{Result, VideoError},
    video::types::{Frame, StereoPair, CHANNELS},
};

/// Build one anaglyph frame from a stereo pair
///
/// Every output pixel depends only on the matching left and right pixels, so
/// rows are recombined in parallel on the current rayon pool. Output has the
/// same dimensions as the inputs.
pub fn recombine(left: &Frame, right: &Frame, mode: ColorBlindnessMode) -> Result<Frame> {
    if left.dimensions() != right.dimensions() {
        return Err(VideoError::FrameProcessingFailed {
            reason: format!(
                "stereo views differ in size: {:?} vs {:?}",
                left.dimensions(),
                right.dimensions()
            ),
        }
        .into());
    }

    let (width, height) = left.dimensions();
    let mut output = Frame::new_black(width, height);
    let stride = output.row_stride();
    if stride == 0 {
        return Ok(output);
    }

    output
        .as_raw_mut()
        .par_chunks_exact_mut(stride)
        .zip(left.as_raw().par_chunks_exact(stride))
        .zip(right.as_raw().par_chunks_exact(stride))
        .for_each(|((out_row, left_row), right_row)| {
            for ((out, l), r) in out_row
                .chunks_exact_mut(CHANNELS)
                .zip(left_row.chunks_exact(CHANNELS))
                .zip(right_row.chunks_exact(CHANNELS))
            {
                out.copy_from_slice(&mode.combine_pixel([l[0], l[1], l[2]], [r[0], r[1], r[2]]));
            }
        });

    Ok(output)
}

/// Recombine a pair produced by the stereo synthesizer
pub fn recombine_pair(pair: &StereoPair, mode: ColorBlindnessMode) -> Result<Frame> {
    recombine(&pair.left, &pair.right, mode)
}
