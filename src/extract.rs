//! Keyframe extraction.
//!
//! The per-video controller runs a fixed sequence of states: open the file,
//! scan every frame accumulating change scores, settle the threshold, then
//! re-seek and emit every frame whose transition score exceeds it. The
//! batch driver applies the controller to every video in a folder, isolating
//! each video's failures so one broken file never aborts the batch.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::FramesiftError,
    metadata::FrameStamp,
    preprocess::canonical_frame,
    score::mean_squared_error,
    source::VideoFile,
};

/// Video file extensions the batch driver recognizes.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

/// Knobs for one extraction run, shared across a batch.
///
/// `None` fields mean "unset": the threshold is then derived per video as
/// the mean of its change scores, and emitted frames are named by frame
/// index instead of reconstructed timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Change-score cutoff. Scores strictly above it cause emission.
    pub threshold: Option<f64>,
    /// Real-world duration of each video in seconds, used to reconstruct
    /// per-frame wall-clock timestamps from the encoded filename.
    pub duration: Option<f64>,
}

/// What one successfully processed video produced.
#[derive(Debug, Clone)]
pub struct VideoSummary {
    /// The processed video.
    pub video: PathBuf,
    /// Frames decoded during the scoring pass.
    pub frames_scanned: u64,
    /// The threshold that was applied (supplied or derived).
    pub threshold: f64,
    /// Frames written to the output directory.
    pub emitted: u64,
}

/// Per-video result inside a batch run.
#[derive(Debug)]
pub struct VideoOutcome {
    /// The video this outcome belongs to.
    pub video: PathBuf,
    /// Success summary, or the isolated failure.
    pub result: Result<VideoSummary, FramesiftError>,
}

/// How emitted frames are named.
enum FrameNaming {
    /// Reconstructed wall-clock timestamp from the encoded filename.
    Timestamped { stamp: FrameStamp, interval: i64 },
    /// Video stem plus frame index.
    Indexed { stem: String },
}

impl FrameNaming {
    fn file_name(&self, frame_number: u64) -> String {
        match self {
            FrameNaming::Timestamped { stamp, interval } => {
                let advanced = stamp.advanced_by(frame_number as i64 * interval);
                format!("{}.jpg", advanced.encoded_stem())
            }
            FrameNaming::Indexed { stem } => format!("{stem}_{frame_number}.jpg"),
        }
    }
}

/// Extract keyframes from a single video into `out_dir`.
///
/// Scans every frame, scoring each transition with the MSE of the canonical
/// (grayscale, cropped, binarized) frames; settles the threshold (supplied,
/// or the mean of all scores); then re-seeks and writes frame `i + 1` as a
/// JPEG for every score index `i` strictly above the threshold, in
/// ascending index order. All decoder resources are released before
/// returning.
///
/// # Errors
///
/// - [`FramesiftError::FileOpen`] if the video cannot be opened.
/// - [`FramesiftError::TooFewFrames`] if fewer than two frames decode; an
///   empty score sequence has no mean.
/// - [`FramesiftError::MalformedName`] if `options.duration` is set but the
///   filename does not carry the `<box>_<cam>_<date>_<time>` encoding;
///   this fails before any frame is emitted.
pub fn extract_video(
    path: &Path,
    out_dir: &Path,
    options: &ExtractOptions,
) -> Result<VideoSummary, FramesiftError> {
    let mut video = VideoFile::open(path)?;

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| FramesiftError::MalformedName {
            name: path.display().to_string(),
            reason: "path has no UTF-8 file stem".to_string(),
        })?;

    // Resolve naming up front: a malformed name must fail the video before
    // any scanning or emission happens.
    let naming = match options.duration {
        Some(duration) => FrameNaming::Timestamped {
            stamp: FrameStamp::parse(stem)?,
            interval: step_interval(duration, video.metadata().frame_count),
        },
        None => FrameNaming::Indexed {
            stem: stem.to_string(),
        },
    };

    // Scoring pass: one score per consecutive frame pair, in frame order.
    let mut previous = None;
    let mut scores = Vec::new();
    let mut frames_scanned = 0_u64;

    video.for_each_frame(|_, frame| {
        let canonical = canonical_frame(&frame);
        if let Some(reference) = previous.as_ref() {
            scores.push(mean_squared_error(reference, &canonical));
        }
        previous = Some(canonical);
        frames_scanned += 1;
        Ok(())
    })?;

    if frames_scanned < 2 {
        return Err(FramesiftError::TooFewFrames {
            path: path.to_path_buf(),
            frames: frames_scanned,
        });
    }

    let threshold = options.threshold.unwrap_or_else(|| mean(&scores));

    let targets: Vec<u64> = exceeding_indices(&scores, threshold)
        .into_iter()
        .map(|score_index| score_index + 1)
        .collect();

    log::debug!(
        "{}: {} frame(s), threshold {:.3}, emitting {} frame(s)",
        path.display(),
        frames_scanned,
        threshold,
        targets.len()
    );

    let mut emitted = 0_u64;
    video.frames_at(&targets, |frame_number, image| {
        let output_path = out_dir.join(naming.file_name(frame_number));
        image.save(&output_path)?;
        emitted += 1;
        Ok(())
    })?;

    Ok(VideoSummary {
        video: path.to_path_buf(),
        frames_scanned,
        threshold,
        emitted,
    })
}

/// List the video files directly inside a directory, in name order.
pub fn video_files(directory: &Path) -> Result<Vec<PathBuf>, FramesiftError> {
    if !directory.is_dir() {
        return Err(FramesiftError::MissingDirectory {
            path: directory.to_path_buf(),
        });
    }

    let mut videos: Vec<PathBuf> = fs::read_dir(directory)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    videos.retain(|path| {
        path.is_file()
            && path
                .extension()
                .and_then(|extension| extension.to_str())
                .is_some_and(|extension| {
                    let lowered = extension.to_ascii_lowercase();
                    VIDEO_EXTENSIONS.contains(&lowered.as_str())
                })
    });
    videos.sort();
    Ok(videos)
}

/// Extract keyframes from every video in `source` into one flat `destination`.
///
/// Creates `destination` if absent. Each video is processed to completion
/// before the next begins; a video that cannot be opened, decodes fewer
/// than two frames, or carries a malformed name is logged, recorded in its
/// [`VideoOutcome`], and skipped; the batch always continues.
///
/// The observer is called after each video with `(processed, total,
/// outcome)`, which is how the CLI drives its progress bar.
///
/// # Errors
///
/// Only batch-level failures (missing source directory, destination
/// creation) return `Err`; per-video failures live in the outcomes.
pub fn extract_folder<F>(
    source: &Path,
    destination: &Path,
    options: &ExtractOptions,
    mut observer: F,
) -> Result<Vec<VideoOutcome>, FramesiftError>
where
    F: FnMut(usize, usize, &VideoOutcome),
{
    let videos = video_files(source)?;
    fs::create_dir_all(destination)?;

    log::debug!(
        "Extracting {} video(s) from {} into {}",
        videos.len(),
        source.display(),
        destination.display()
    );

    let total = videos.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, video) in videos.into_iter().enumerate() {
        let result = extract_video(&video, destination, options);
        if let Err(error) = &result {
            log::warn!("Skipping {}: {error}", video.display());
        }

        let outcome = VideoOutcome { video, result };
        observer(index + 1, total, &outcome);
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Arithmetic mean of a non-empty score sequence.
fn mean(scores: &[f64]) -> f64 {
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Score indices strictly above the threshold, ascending.
fn exceeding_indices(scores: &[f64], threshold: f64) -> Vec<u64> {
    scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score > threshold)
        .map(|(index, _)| index as u64)
        .collect()
}

/// Seconds of wall-clock time covered by one frame step:
/// `floor(duration / (frame_count + 1))`.
fn step_interval(duration: f64, frame_count: u64) -> i64 {
    (duration / (frame_count + 1) as f64) as i64
}
