//! Realizing a [`SortedTree`] as a directory hierarchy.
//!
//! Each branch bucket becomes a directory under its parent, and every leaf
//! image is copied (never moved) into its resolved directory. The source
//! images stay in place; removing them is a separate explicit step
//! ([`clear_tree`]) that callers run only after materialization succeeds.

use std::{fs, path::Path};

use crate::{classify::SortedTree, error::FramesiftError};

/// Walk the tree depth-first and copy every image into its bucket directory.
///
/// `destination` is created as needed; bucket directories are created before
/// anything is written into them. Returns the number of images copied.
///
/// # Errors
///
/// Filesystem failures (directory creation, copy) propagate immediately; no
/// retry, no partial-success accounting.
pub fn materialize(tree: &SortedTree, destination: &Path) -> Result<u64, FramesiftError> {
    log::debug!(
        "Materializing {} image(s) under {}",
        tree.image_count(),
        destination.display()
    );

    let mut copied = 0_u64;
    materialize_node(tree, destination, &mut copied)?;
    Ok(copied)
}

fn materialize_node(
    tree: &SortedTree,
    directory: &Path,
    copied: &mut u64,
) -> Result<(), FramesiftError> {
    fs::create_dir_all(directory)?;

    match tree {
        SortedTree::Leaf(images) => {
            for image in images {
                let file_name = image
                    .file_name()
                    .ok_or_else(|| FramesiftError::MalformedName {
                        name: image.display().to_string(),
                        reason: "image path has no file name".to_string(),
                    })?;
                fs::copy(image, directory.join(file_name))?;
                *copied += 1;
            }
        }
        SortedTree::Branch(children) => {
            for (bucket, child) in children {
                materialize_node(child, &directory.join(bucket), copied)?;
            }
        }
    }

    Ok(())
}

/// Remove a source tree after its contents have been materialized elsewhere.
///
/// Explicitly separate from [`materialize`] so a failed materialization
/// never destroys the only copy of the input.
pub fn clear_tree(path: &Path) -> Result<(), FramesiftError> {
    log::debug!("Clearing source tree {}", path.display());
    fs::remove_dir_all(path)?;
    Ok(())
}
