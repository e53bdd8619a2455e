//! # framesift
//!
//! Sift surveillance footage down to the frames that matter: extract
//! keyframes from fixed-camera video, sort them into metadata-derived
//! folder trees, and repack the result into fixed-size review batches.
//!
//! `framesift` scores every frame transition with the mean squared error of
//! canonicalized (grayscale, cropped, binarized) frames, keeps only the
//! frames whose score exceeds a threshold, and names the survivors after the
//! wall-clock moment they were captured. Decoding is powered by FFmpeg via
//! the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract Keyframes from One Video
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesift::{ExtractOptions, extract_video};
//!
//! let options = ExtractOptions { threshold: None, duration: Some(90.0) };
//! let summary = extract_video(
//!     Path::new("3_1_2023-07-17_10-00-00.mp4"),
//!     Path::new("frames"),
//!     &options,
//! ).unwrap();
//! println!("{} frame(s) kept", summary.emitted);
//! ```
//!
//! ### Sort Extracted Frames
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesift::{SortPlan, classify, discover_images, materialize};
//!
//! let plan = SortPlan::parse(&["box", "cam", "hour"]).unwrap();
//! let images = discover_images(Path::new("frames"), &plan.filters).unwrap();
//! let tree = classify(images, &plan.keys).unwrap();
//! materialize(&tree, Path::new("frames_sorted")).unwrap();
//! ```
//!
//! ### Equalize a Sorted Tree into Batches
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framesift::equalize;
//!
//! let summary = equalize(
//!     Path::new("frames_sorted"),
//!     Path::new("batches"),
//!     4,
//!     0, // derive the batch count from the fullest directory
//! ).unwrap();
//! println!("{} batch folder(s)", summary.folders_created);
//! ```
//!
//! ## Pipeline
//!
//! The three stages compose into the full pipeline (the `run` subcommand of
//! the CLI): extract every video in a folder, sort the emitted frames, then
//! equalize the sorted tree. Each stage reads only what the previous stage
//! wrote, so they can also be run independently and repeatedly.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod classify;
pub mod equalize;
pub mod error;
pub mod extract;
pub mod materialize;
pub mod metadata;
pub mod preprocess;
pub mod rename;
pub mod score;
pub mod source;

pub use classify::{IMAGE_EXTENSIONS, SortPlan, SortedTree, classify, discover_images};
pub use equalize::{EqualizeSummary, equalize};
pub use error::FramesiftError;
pub use extract::{
    ExtractOptions, VIDEO_EXTENSIONS, VideoOutcome, VideoSummary, extract_folder, extract_video,
    video_files,
};
pub use materialize::{clear_tree, materialize};
pub use metadata::{ENCODED_DATE_TIME_FORMAT, FrameStamp, SortKey};
pub use preprocess::{SIDE_CROP_RATIO, canonical_frame};
pub use rename::renumber;
pub use score::mean_squared_error;
pub use source::{VideoFile, VideoMetadata};
