//! Error types for the `framesift` crate.
//!
//! This module defines [`FramesiftError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose the problem at the call site, including file paths, frame counts,
//! and upstream error messages.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framesift` operations.
///
/// Every public method that can fail returns `Result<T, FramesiftError>`.
/// Per-video failures (unopenable file, too few frames) are isolated by the
/// batch driver; everything else propagates to the caller immediately.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramesiftError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecode(String),

    /// The video has fewer than two decodable frames, so no change score
    /// sequence exists and no threshold can be derived.
    #[error("Video {path} has {frames} decodable frame(s); at least 2 are required")]
    TooFewFrames {
        /// Path of the degenerate video.
        path: PathBuf,
        /// Number of frames that were decoded.
        frames: u64,
    },

    /// A filename does not follow the `<box>_<cam>_<date>_<time>` encoding.
    ///
    /// Raised whenever a metadata field or timestamp is required; the
    /// operation that needed the field aborts rather than guessing.
    #[error("Malformed frame name {name:?}: {reason}")]
    MalformedName {
        /// The offending file name.
        name: String,
        /// Which segment failed to parse, and why.
        reason: String,
    },

    /// A sort/filter mode token does not name a known metadata field.
    ///
    /// Fatal to the whole classification call; no partial tree is returned.
    #[error("Unknown sort key {0:?} (expected box, cam, year, month, day, hour, minute, or second)")]
    UnknownSortKey(String),

    /// A directory that must already exist does not.
    #[error("Directory not found: {path}")]
    MissingDirectory {
        /// The missing path.
        path: PathBuf,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading, writing, copying, or moving files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while encoding an emitted frame.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for FramesiftError {
    fn from(error: FfmpegError) -> Self {
        FramesiftError::Ffmpeg(error.to_string())
    }
}
