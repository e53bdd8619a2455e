//! Folder equalization.
//!
//! Repacks the images of a (typically sorted) directory tree into a run of
//! fixed-capacity batch folders. Every directory in the source tree
//! contributes up to `per_folder` of its direct images to each batch:
//! images are **moved** out when a directory fills its whole quota, and
//! **copied** when fewer remain. A partial batch therefore leaves its
//! originals in the source tree, available for another pass.
//!
//! A batch that reaches the expected saturation count
//! (`non-empty source directories × per_folder`) is rename-tagged with a
//! `_full` suffix; everything else, including folders left empty by an
//! exhausted source, stays as-is.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::error::FramesiftError;

/// Extensions counted when measuring directory occupancy.
const COUNT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Extensions eligible for harvesting into a batch folder.
///
/// Narrower than [`COUNT_EXTENSIONS`]: `.bmp` files are counted but never
/// repacked, mirroring the behavior this tool has always had.
const HARVEST_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Suffix appended to a batch folder that reached saturation.
const FULL_SUFFIX: &str = "_full";

/// Result of one equalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqualizeSummary {
    /// Number of batch folders created.
    pub folders_created: usize,
    /// How many of them were rename-tagged as full.
    pub full_folders: usize,
    /// Total images placed (moved or copied) into batch folders.
    pub images_placed: u64,
}

/// Repack a source tree into `folder_count` batch folders of up to
/// `per_folder` images each.
///
/// When `folder_count` is zero it is derived as
/// `floor(max images in any one source directory / per_folder)`. Batch
/// folders are created under `destination` and named
/// `<destination-name>_<i>` for i starting at 1.
///
/// The per-directory census and the saturation capacity are computed once,
/// up front; later moves do not update them.
///
/// # Errors
///
/// Returns [`FramesiftError::MissingDirectory`] if `source` does not exist;
/// filesystem failures propagate immediately.
pub fn equalize(
    source: &Path,
    destination: &Path,
    per_folder: usize,
    folder_count: usize,
) -> Result<EqualizeSummary, FramesiftError> {
    if !source.is_dir() {
        return Err(FramesiftError::MissingDirectory {
            path: source.to_path_buf(),
        });
    }
    if per_folder == 0 {
        return Ok(EqualizeSummary::default());
    }

    fs::create_dir_all(destination)?;

    let census = count_images_per_directory(source)?;
    let non_empty = census.values().filter(|&&count| count > 0).count();
    let capacity = non_empty * per_folder;
    let max_per_directory = census.values().copied().max().unwrap_or(0);

    let folder_count = if folder_count == 0 {
        max_per_directory / per_folder
    } else {
        folder_count
    };

    log::debug!(
        "Equalizing {} -> {}: {} batch folder(s), {} per directory, capacity {}",
        source.display(),
        destination.display(),
        folder_count,
        per_folder,
        capacity
    );

    let batch_stem = destination
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("batch")
        .to_string();

    let mut summary = EqualizeSummary::default();

    for index in 1..=folder_count {
        let batch = destination.join(format!("{batch_stem}_{index}"));
        fs::create_dir_all(&batch)?;
        summary.folders_created += 1;

        summary.images_placed += harvest(source, &batch, per_folder)?;

        if capacity > 0 && count_direct_images(&batch)? == capacity {
            let full = batch.with_file_name(format!("{batch_stem}_{index}{FULL_SUFFIX}"));
            fs::rename(&batch, &full)?;
            summary.full_folders += 1;
        }
    }

    Ok(summary)
}

/// Pull images from every directory of the source tree into `batch`.
///
/// Explicit worklist instead of recursion, so pathological nesting cannot
/// blow the stack. Each visited directory contributes up to `quota` of its
/// direct images: moved when the quota is filled exactly, copied when fewer
/// were found. Once a directory fills its quota, its remaining entries
/// (including subdirectories listed after the quota point) are skipped for
/// this batch.
fn harvest(source: &Path, batch: &Path, quota: usize) -> Result<u64, FramesiftError> {
    let mut placed = 0_u64;
    let mut worklist = vec![source.to_path_buf()];

    while let Some(directory) = worklist.pop() {
        let mut picked: Vec<PathBuf> = Vec::new();
        let mut filled = false;

        for entry in sorted_entries(&directory)? {
            if entry.is_dir() {
                worklist.push(entry);
            } else if has_extension(&entry, HARVEST_EXTENSIONS) {
                picked.push(entry);
                if picked.len() == quota {
                    for image in &picked {
                        move_file(image, &batch.join(file_name(image)?))?;
                        placed += 1;
                    }
                    filled = true;
                    break;
                }
            }
        }

        if !filled && !picked.is_empty() {
            for image in &picked {
                fs::copy(image, batch.join(file_name(image)?))?;
                placed += 1;
            }
        }
    }

    Ok(placed)
}

/// Count images directly inside every directory of the tree, keyed by path.
fn count_images_per_directory(
    root: &Path,
) -> Result<BTreeMap<PathBuf, usize>, FramesiftError> {
    let mut census = BTreeMap::new();
    let mut worklist = vec![root.to_path_buf()];

    while let Some(directory) = worklist.pop() {
        let mut count = 0;
        for entry in sorted_entries(&directory)? {
            if entry.is_dir() {
                worklist.push(entry);
            } else if has_extension(&entry, COUNT_EXTENSIONS) {
                count += 1;
            }
        }
        census.insert(directory, count);
    }

    Ok(census)
}

/// Count images directly inside one directory (non-recursive).
fn count_direct_images(directory: &Path) -> Result<usize, FramesiftError> {
    let mut count = 0;
    for entry in sorted_entries(directory)? {
        if entry.is_file() && has_extension(&entry, COUNT_EXTENSIONS) {
            count += 1;
        }
    }
    Ok(count)
}

/// Directory entries in name order, for deterministic batching.
fn sorted_entries(directory: &Path) -> Result<Vec<PathBuf>, FramesiftError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(directory)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();
    Ok(entries)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            let lowered = extension.to_ascii_lowercase();
            extensions.contains(&lowered.as_str())
        })
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, FramesiftError> {
    path.file_name().ok_or_else(|| FramesiftError::MalformedName {
        name: path.display().to_string(),
        reason: "image path has no file name".to_string(),
    })
}

/// Move a file, falling back to copy + remove across filesystem boundaries.
fn move_file(from: &Path, to: &Path) -> Result<(), FramesiftError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn touch(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(b"img").unwrap();
    }

    #[test]
    fn census_counts_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        touch(&a.join("1.jpg"));
        touch(&a.join("2.png"));
        touch(&b.join("3.bmp"));
        touch(&b.join("skip.txt"));

        let census = count_images_per_directory(dir.path()).unwrap();
        assert_eq!(census[&a], 2);
        assert_eq!(census[&b], 1);
        assert_eq!(census[&dir.path().to_path_buf()], 0);
    }

    #[test]
    fn harvest_moves_exact_quota_and_copies_remainder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let batch = dir.path().join("batch");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&batch).unwrap();
        for index in 0..5 {
            touch(&source.join(format!("{index}.jpg")));
        }

        // First batch: quota of 3 is filled exactly, images are moved.
        let placed = harvest(&source, &batch, 3).unwrap();
        assert_eq!(placed, 3);
        assert_eq!(count_direct_images(&source).unwrap(), 2);

        // Second batch: only 2 remain, so they are copied, not moved.
        let batch_two = dir.path().join("batch2");
        fs::create_dir_all(&batch_two).unwrap();
        let placed = harvest(&source, &batch_two, 3).unwrap();
        assert_eq!(placed, 2);
        assert_eq!(count_direct_images(&source).unwrap(), 2);
        assert_eq!(count_direct_images(&batch_two).unwrap(), 2);
    }

    #[test]
    fn harvest_skips_bmp_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let batch = dir.path().join("batch");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&batch).unwrap();
        touch(&source.join("keep.jpg"));
        touch(&source.join("leave.bmp"));

        harvest(&source, &batch, 4).unwrap();
        assert!(batch.join("keep.jpg").exists());
        assert!(!batch.join("leave.bmp").exists());
        // Counted but never harvested.
        assert_eq!(count_direct_images(&source).unwrap(), 2);
    }
}
