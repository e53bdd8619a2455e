//! Image discovery and recursive multi-key classification.
//!
//! [`discover_images`] walks a directory tree and collects image paths,
//! optionally excluding frames whose metadata fields do not match the
//! [`SortPlan`]'s filter bindings. [`classify`] then partitions the flat
//! list into a [`SortedTree`] by applying each sort key in turn: the first
//! key splits the list into buckets, and each bucket is classified
//! recursively with the remaining keys.
//!
//! Filtering happens exactly once, during discovery, before any recursive
//! partitioning runs.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    error::FramesiftError,
    metadata::{FrameStamp, SortKey},
};

/// Extensions recognized as images during discovery.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// A nested classification of frame paths.
///
/// Built bottom-up from an ordered key sequence: the same keys and the same
/// input list always yield the same tree shape and the same bucket order.
/// Branch buckets iterate in lexicographic order; leaf lists preserve the
/// relative order of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortedTree {
    /// Sort keys exhausted: an ordered list of frame paths.
    Leaf(Vec<PathBuf>),
    /// More keys pending: bucket name to subtree.
    Branch(BTreeMap<String, SortedTree>),
}

impl SortedTree {
    /// Total number of images across all leaves.
    pub fn image_count(&self) -> usize {
        match self {
            SortedTree::Leaf(images) => images.len(),
            SortedTree::Branch(children) => {
                children.values().map(SortedTree::image_count).sum()
            }
        }
    }

    /// All leaf image paths, depth-first in bucket order.
    pub fn images(&self) -> Vec<&PathBuf> {
        let mut collected = Vec::new();
        self.collect_images(&mut collected);
        collected
    }

    fn collect_images<'a>(&'a self, into: &mut Vec<&'a PathBuf>) {
        match self {
            SortedTree::Leaf(images) => into.extend(images.iter()),
            SortedTree::Branch(children) => {
                for child in children.values() {
                    child.collect_images(into);
                }
            }
        }
    }
}

/// A parsed sort-mode sequence: the keys to partition by, in order, plus
/// any filter bindings that constrain discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortPlan {
    /// Partition keys, applied outermost first.
    pub keys: Vec<SortKey>,
    /// Field filters applied once, during discovery: an image is kept only
    /// if every bound field equals the bound value.
    pub filters: Vec<(SortKey, u32)>,
}

impl SortPlan {
    /// Parse a raw mode token list.
    ///
    /// Each token must name a [`SortKey`]; a key token immediately followed
    /// by a standalone integer token binds that integer as a discovery
    /// filter for the key (the key still participates in partitioning).
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::UnknownSortKey`] for any token that is
    /// neither a key nor a filter value; the whole plan is rejected.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, FramesiftError> {
        let mut plan = SortPlan::default();
        let mut index = 0;

        while index < tokens.len() {
            let key: SortKey = tokens[index].as_ref().parse()?;
            plan.keys.push(key);

            if let Some(next) = tokens.get(index + 1)
                && let Ok(value) = next.as_ref().parse::<u32>()
            {
                plan.filters.push((key, value));
                index += 2;
            } else {
                index += 1;
            }
        }

        Ok(plan)
    }
}

/// Recursively collect image files under `root`, in deterministic
/// (name-sorted) walk order.
///
/// With filter bindings, every candidate's name is parsed as a
/// [`FrameStamp`] and non-matching images are excluded; a malformed name
/// fails the whole discovery. Without filters no parsing happens and every
/// image is kept.
///
/// # Errors
///
/// Returns [`FramesiftError::MalformedName`] when a filter requires a field
/// from an unparseable name, or an I/O error from the directory walk.
pub fn discover_images(
    root: &Path,
    filters: &[(SortKey, u32)],
) -> Result<Vec<PathBuf>, FramesiftError> {
    log::debug!(
        "Discovering images under {} ({} filter(s))",
        root.display(),
        filters.len()
    );

    let mut images = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|error| {
            FramesiftError::Io(error.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if !is_image(&path) {
            continue;
        }

        if !filters.is_empty() {
            let stamp = FrameStamp::from_path(&path)?;
            if !filters
                .iter()
                .all(|&(key, value)| stamp.field(key) == value)
            {
                continue;
            }
        }

        images.push(path);
    }

    Ok(images)
}

/// Recursively partition `images` by the given key sequence.
///
/// The base case of an empty key sequence returns the list unchanged as a
/// [`SortedTree::Leaf`]. Otherwise the first key buckets the images
/// (preserving each bucket's relative input order) and the remaining keys
/// classify each bucket in turn.
///
/// # Errors
///
/// Returns [`FramesiftError::MalformedName`] if any image name cannot be
/// parsed; no partial tree is produced.
pub fn classify(images: Vec<PathBuf>, keys: &[SortKey]) -> Result<SortedTree, FramesiftError> {
    let Some((&first, rest)) = keys.split_first() else {
        return Ok(SortedTree::Leaf(images));
    };

    let mut buckets: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for image in images {
        let stamp = FrameStamp::from_path(&image)?;
        buckets.entry(stamp.bucket(first)).or_default().push(image);
    }

    let mut children = BTreeMap::new();
    for (bucket, group) in buckets {
        children.insert(bucket, classify(group, rest)?);
    }

    Ok(SortedTree::Branch(children))
}

/// Whether a path carries a recognized image extension.
pub(crate) fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            let lowered = extension.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&lowered.as_str())
        })
}
