use tracing::{debug, info};

use crate::{
    anaglyph::{anaglyph_frame, ColorBlindnessMode, StereoSynthesizer},
    error::Result,
    video::{FrameSink, FrameSource},
};

/// Run every source frame through the anaglyph transform into the sink
///
/// Frames are handled one at a time in decode order, so output frame `i` is
/// always source frame `i`. Each frame is dropped once written. Returns the
/// number of frames written. The sink is not finished here.
pub fn drive_frames<S, K>(
    source: &mut S,
    sink: &mut K,
    synthesizer: &StereoSynthesizer,
    mode: ColorBlindnessMode,
    progress_interval: u64,
) -> Result<u64>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let expected = source.metadata().frame_count;
    let mut written = 0u64;

    while let Some(frame) = source.next_frame()? {
        let output = anaglyph_frame(&frame, synthesizer, mode)?;
        sink.write_frame(&output)?;
        written += 1;

        if progress_interval > 0 && written % progress_interval == 0 {
            if expected > 0 {
                info!("Processed {}/{} frames", written, expected);
            } else {
                info!("Processed {} frames", written);
            }
        }
    }

    debug!("Frame loop finished: {} frames sent, sink holds {}", written, sink.frames_written());
    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{ConverterError, VideoError};
    use crate::video::{Frame, FrameRate, VideoMetadata};

    /// In-memory source handing out a fixed list of frames
    pub(crate) struct VecSource {
        metadata: VideoMetadata,
        frames: std::vec::IntoIter<Frame>,
        pub reads: usize,
    }

    impl VecSource {
        pub(crate) fn new(width: u32, height: u32, frames: Vec<Frame>) -> Self {
            Self {
                metadata: VideoMetadata {
                    width,
                    height,
                    frame_rate: FrameRate::new(10, 1),
                    frame_count: frames.len() as u64,
                    duration: None,
                    has_audio: true,
                },
                frames: frames.into_iter(),
                reads: 0,
            }
        }
    }

    impl FrameSource for VecSource {
        fn metadata(&self) -> &VideoMetadata {
            &self.metadata
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            self.reads += 1;
            Ok(self.frames.next())
        }
    }

    /// In-memory sink that keeps everything written to it
    #[derive(Default)]
    pub(crate) struct VecSink {
        pub frames: Vec<Frame>,
        pub finished: bool,
    }

    impl FrameSink for VecSink {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn frames_written(&self) -> u64 {
            self.frames.len() as u64
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    /// Frame whose every pixel carries its index, for order checks
    pub(crate) fn numbered_frame(index: u8, width: u32, height: u32) -> Frame {
        Frame::new_filled(width, height, [index, index, index])
    }

    #[test]
    fn test_frame_count_and_order() {
        for count in [0usize, 1, 7, 40] {
            let frames = (0..count).map(|i| numbered_frame(i as u8, 16, 8)).collect();
            let mut source = VecSource::new(16, 8, frames);
            let mut sink = VecSink::default();

            let written = drive_frames(
                &mut source,
                &mut sink,
                &StereoSynthesizer::default(),
                ColorBlindnessMode::Standard,
                5,
            )
            .unwrap();

            assert_eq!(written, count as u64);
            assert_eq!(sink.frames.len(), count);
            // Uniform frames are unchanged by shifting and by the standard policy.
            for (i, frame) in sink.frames.iter().enumerate() {
                assert_eq!(frame.get_pixel(0, 0), [i as u8; 3]);
                assert_eq!(frame.dimensions(), (16, 8));
            }
            assert!(!sink.finished);
        }
    }

    #[test]
    fn test_output_matches_per_frame_transform() {
        let source_frame = Frame::from_fn(30, 4, |x, y| [x as u8, (y * 40) as u8, (255 - x) as u8]);
        let synthesizer = StereoSynthesizer::default();
        let expected = anaglyph_frame(&source_frame, &synthesizer, ColorBlindnessMode::Tritanopia).unwrap();

        let mut source = VecSource::new(30, 4, vec![source_frame]);
        let mut sink = VecSink::default();
        drive_frames(&mut source, &mut sink, &synthesizer, ColorBlindnessMode::Tritanopia, 100).unwrap();

        assert_eq!(sink.frames, vec![expected]);
    }

    #[test]
    fn test_sink_failure_stops_loop() {
        struct FailingSink;

        impl FrameSink for FailingSink {
            fn write_frame(&mut self, _frame: &Frame) -> Result<()> {
                Err(VideoError::EncodingFailed { reason: "disk full".to_string() }.into())
            }
            fn frames_written(&self) -> u64 {
                0
            }
            fn finish(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let frames = (0..3).map(|i| numbered_frame(i, 4, 4)).collect();
        let mut source = VecSource::new(4, 4, frames);
        let result = drive_frames(
            &mut source,
            &mut FailingSink,
            &StereoSynthesizer::default(),
            ColorBlindnessMode::Standard,
            1,
        );

        assert!(matches!(result, Err(ConverterError::Video(VideoError::EncodingFailed { .. }))));
        assert_eq!(source.reads, 1);
    }
}
