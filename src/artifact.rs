//! Copy the build output into the downstream checkout.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{GitPromoteError, Result};

const GIT_DIR: &str = ".git";

/// Replace the contents of `destination` with a copy of `dist`.
///
/// Everything in `destination` except `.git` is removed first, so files
/// dropped from the build disappear downstream too. Returns the number of
/// files copied.
pub fn stage_artifact(dist: &Path, destination: &Path) -> Result<usize> {
    if !dist.is_dir() {
        return Err(GitPromoteError::config(format!(
            "build output '{}' does not exist or is not a directory",
            dist.display()
        )));
    }

    debug!(dist = %dist.display(), destination = %destination.display(), "staging artifact");
    clear_directory(destination)?;
    copy_recursive(dist, destination)
}

fn clear_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == GIT_DIR {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn copy_recursive(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to)?;

    let mut copied = 0;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copied += copy_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
