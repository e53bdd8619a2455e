//! Bulk renumbering helper.
//!
//! Renames every file in a directory to `<index>_<rest>`, where `<rest>` is
//! everything after the original name's first underscore and indices count
//! up from 1 in name order. Handy for collapsing the box identifier of a
//! copied frame set into a simple sequence number.

use std::{fs, path::Path};

use crate::error::FramesiftError;

/// Renumber every file in `directory`. Returns the number of renames.
///
/// Subdirectories are left untouched. A name without an underscore keeps
/// nothing past the index prefix.
///
/// # Errors
///
/// Returns [`FramesiftError::MissingDirectory`] if `directory` does not
/// exist; rename failures propagate immediately.
pub fn renumber(directory: &Path) -> Result<u64, FramesiftError> {
    if !directory.is_dir() {
        return Err(FramesiftError::MissingDirectory {
            path: directory.to_path_buf(),
        });
    }

    let mut entries: Vec<_> = fs::read_dir(directory)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    let mut index = 1_u64;
    let mut renamed = 0_u64;

    for path in entries {
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let rest = name.split_once('_').map(|(_, rest)| rest).unwrap_or("");
        let new_name = format!("{index}_{rest}");
        fs::rename(&path, directory.join(new_name))?;

        index += 1;
        renamed += 1;
    }

    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn renumbers_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("7_a_x.jpg")).unwrap();
        File::create(dir.path().join("9_b_y.jpg")).unwrap();

        let renamed = renumber(dir.path()).unwrap();
        assert_eq!(renamed, 2);
        assert!(dir.path().join("1_a_x.jpg").exists());
        assert!(dir.path().join("2_b_y.jpg").exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            renumber(&missing),
            Err(FramesiftError::MissingDirectory { .. })
        ));
    }
}
