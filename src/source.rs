//! Video file access.
//!
//! [`VideoFile`] wraps an FFmpeg demuxer context for a single video file and
//! exposes the two access patterns the extraction pipeline needs: a
//! sequential decode of every frame ([`VideoFile::for_each_frame`]) for the
//! scoring pass, and an indexed decode of selected frames
//! ([`VideoFile::frames_at`]) for the emission pass. Decoded frames are
//! delivered as [`image::DynamicImage`] values in RGB8 format.
//!
//! Exactly one `VideoFile` is alive at a time in this crate; all FFmpeg
//! resources are released when it drops.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::FramesiftError;

/// Cached properties of the opened video stream.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second.
    pub frames_per_second: f64,
    /// Total number of frames in the stream.
    ///
    /// Taken from the container when it records a frame count, otherwise
    /// estimated from duration and frame rate.
    pub frame_count: u64,
}

/// An opened video file.
///
/// Created via [`VideoFile::open`]. Holds the demuxer context, the index of
/// the best video stream, and cached [`VideoMetadata`].
pub struct VideoFile {
    input: Input,
    stream_index: usize,
    time_base: Rational,
    metadata: VideoMetadata,
    path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("path", &self.path)
            .field("stream_index", &self.stream_index)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file for frame access.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FileOpen`] if the file cannot be opened or
    /// contains no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref().to_path_buf();

        log::debug!("Opening video file: {}", path.display());

        // Safe to call multiple times.
        ffmpeg_next::init().map_err(|error| FramesiftError::FileOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| {
            FramesiftError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            }
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| FramesiftError::FileOpen {
                path: path.clone(),
                reason: "no video stream".to_string(),
            })?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let container_frames = stream.frames();

        let codec_parameters = stream.parameters();
        let decoder_context =
            CodecContext::from_parameters(codec_parameters).map_err(|error| {
                FramesiftError::FileOpen {
                    path: path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| FramesiftError::FileOpen {
                path: path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let width = decoder.width();
        let height = decoder.height();

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        // Prefer the container's own frame count; fall back to an estimate
        // from duration and frame rate.
        let frame_count = if container_frames > 0 {
            container_frames as u64
        } else {
            let duration_microseconds = input.duration();
            if duration_microseconds > 0 && frames_per_second > 0.0 {
                (duration_microseconds as f64 / 1_000_000.0 * frames_per_second) as u64
            } else {
                0
            }
        };

        let metadata = VideoMetadata {
            width,
            height,
            frames_per_second,
            frame_count,
        };

        Ok(Self {
            input,
            stream_index,
            time_base,
            metadata,
            path,
        })
    }

    /// Cached metadata for the opened video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode every frame in order and pass each to the handler.
    ///
    /// Seeks back to the start of the stream first, so the method can be
    /// called after a previous pass has consumed packets. The handler
    /// receives the zero-based frame number in decode order and the decoded
    /// RGB image. Processing stops at the first handler error.
    ///
    /// # Errors
    ///
    /// Returns decoding errors, or the first error from the handler.
    pub fn for_each_frame<F>(&mut self, mut handler: F) -> Result<(), FramesiftError>
    where
        F: FnMut(u64, DynamicImage) -> Result<(), FramesiftError>,
    {
        let stream_index = self.stream_index;
        let (mut decoder, mut scaler) = self.fresh_decoder()?;

        self.input.seek(0, ..0)?;

        let width = self.metadata.width;
        let height = self.metadata.height;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let mut frame_number = 0_u64;

        for (stream, packet) in self.input.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                let image = frame_to_image(&rgb_frame, width, height)?;
                handler(frame_number, image)?;
                frame_number += 1;
            }
        }

        // Flush the decoder.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            scaler.run(&decoded_frame, &mut rgb_frame)?;
            let image = frame_to_image(&rgb_frame, width, height)?;
            handler(frame_number, image)?;
            frame_number += 1;
        }

        Ok(())
    }

    /// Decode frames at specific frame numbers and pass each to the handler.
    ///
    /// Frame numbers are sorted and deduplicated, then decoded in a single
    /// forward pass after one seek, so the handler is always invoked in
    /// ascending frame-number order.
    ///
    /// # Errors
    ///
    /// Returns decoding errors, or the first error from the handler.
    pub fn frames_at<F>(
        &mut self,
        frame_numbers: &[u64],
        mut handler: F,
    ) -> Result<(), FramesiftError>
    where
        F: FnMut(u64, DynamicImage) -> Result<(), FramesiftError>,
    {
        if frame_numbers.is_empty() {
            return Ok(());
        }

        let mut targets = frame_numbers.to_vec();
        targets.sort_unstable();
        targets.dedup();

        let stream_index = self.stream_index;
        let time_base = self.time_base;
        let frames_per_second = self.metadata.frames_per_second;
        let width = self.metadata.width;
        let height = self.metadata.height;

        let (mut decoder, mut scaler) = self.fresh_decoder()?;

        // Seek to the nearest keyframe before the first target, then decode
        // forward.
        let first_timestamp =
            frame_number_to_stream_timestamp(targets[0], frames_per_second, time_base);
        self.input.seek(first_timestamp, ..first_timestamp)?;

        let mut target_index = 0;
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input.packets() {
            if target_index >= targets.len() {
                break;
            }
            if stream.index() != stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if target_index >= targets.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current = pts_to_frame_number(pts, time_base, frames_per_second);

                // Skip targets the seek landed past.
                while target_index < targets.len() && targets[target_index] < current {
                    target_index += 1;
                }

                if target_index < targets.len() && current == targets[target_index] {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let image = frame_to_image(&rgb_frame, width, height)?;
                    handler(current, image)?;
                    target_index += 1;
                }
            }
        }

        // Flush the decoder for any remaining targets.
        if target_index < targets.len() {
            decoder.send_eof()?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if target_index >= targets.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current = pts_to_frame_number(pts, time_base, frames_per_second);

                while target_index < targets.len() && targets[target_index] < current {
                    target_index += 1;
                }

                if target_index < targets.len() && current == targets[target_index] {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let image = frame_to_image(&rgb_frame, width, height)?;
                    handler(current, image)?;
                    target_index += 1;
                }
            }
        }

        Ok(())
    }

    /// Build a fresh decoder and RGB24 scaling context for the video stream.
    fn fresh_decoder(
        &self,
    ) -> Result<
        (
            ffmpeg_next::decoder::Video,
            ScalingContext,
        ),
        FramesiftError,
    > {
        let stream = self
            .input
            .stream(self.stream_index)
            .ok_or(FramesiftError::NoVideoStream)?;
        let codec_parameters = stream.parameters();
        let decoder_context = CodecContext::from_parameters(codec_parameters)?;
        let decoder = decoder_context.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            self.metadata.width,
            self.metadata.height,
            ScalingFlags::BILINEAR,
        )?;

        Ok((decoder, scaler))
    }
}

/// Convert a scaled RGB24 video frame to an [`image::DynamicImage`].
fn frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, FramesiftError> {
    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramesiftError::VideoDecode(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}

/// Copy pixel data from an FFmpeg video frame into a tightly-packed RGB buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3); this
/// strips the padding so the result can be passed to
/// [`image::RgbImage::from_raw`].
fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a frame number to a timestamp in the stream's time base.
fn frame_number_to_stream_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    time_base: Rational,
) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    let numerator = time_base.numerator() as f64;
    let denominator = time_base.denominator() as f64;
    (seconds * denominator / numerator) as i64
}

/// Rescale a PTS value to a frame number.
fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * frames_per_second) as u64
}
