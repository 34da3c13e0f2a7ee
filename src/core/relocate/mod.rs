//! # Relocate Module
//!
//! File moves shared by consolidation and organize.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Move `source` to `destination`, which must not exist.
///
/// Tries a rename first. Across filesystems the file is copied, the copy's
/// size checked against the source, and only then is the source removed.
pub fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    if destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        ));
    }

    fs::rename(source, destination).or_else(|_| {
        let source_size = fs::metadata(source)?.len();
        fs::copy(source, destination)?;

        let dest_size = fs::metadata(destination)?.len();
        if dest_size != source_size {
            let _ = fs::remove_file(destination);
            return Err(io::Error::other(format!(
                "Copy verification failed: source {} bytes, dest {} bytes",
                source_size, dest_size
            )));
        }

        fs::remove_file(source)
    })
}

/// Free slot for `file_name` in `dir`: the name itself, else `stem_2.ext`,
/// `stem_3.ext`, ...
pub fn unique_destination(dir: &Path, file_name: &Path) -> PathBuf {
    let first = dir.join(file_name);
    if !first.exists() {
        return first;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (2u64..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
