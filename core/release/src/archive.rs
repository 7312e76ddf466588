//! ZIP and tar.gz extraction through a caller-supplied entry filter.
//!
//! The filter sees every regular-file entry name and either rejects it
//! (`None`) or returns the path, relative to the destination root, to write
//! it to. This lets the installer pull one executable out of a release
//! archive and flatten it to its final name.
//!
//! Every entry name, including names the filter would reject, is checked for
//! containment before anything else happens: the destination root joined with
//! the stored name, cleaned lexically, must lie strictly inside the root. The
//! renamed output path is checked the same way. A violation aborts the whole
//! extraction with [`ReleaseError::PathTraversal`].
//!
//! Directories and non-regular entries (links, devices) are never written.
//! Accepted files get the permission bits recorded in the archive and are
//! synced to storage before the next entry is read.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use crate::error::{ReleaseError, Result};

/// Container formats a release asset can be packaged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A ZIP file.
    Zip,
    /// A gzip-compressed tarball.
    TarGz,
}

impl ArchiveFormat {
    /// Determines the format from the suffix of a file name or URL.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        if lowered.ends_with(".zip") {
            Some(Self::Zip)
        } else if lowered.ends_with(".tar.gz") || lowered.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }

    /// The file extension used for staging archives of this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }
}

/// Extracts `archive_path` in the given format into `dest_root`.
///
/// Returns the number of files written.
///
/// # Errors
///
/// See [`extract_zip`] and [`extract_tar_gz`].
pub fn extract<F>(
    format: ArchiveFormat,
    archive_path: &Path,
    dest_root: &Path,
    filter: F,
) -> Result<usize>
where
    F: FnMut(&Path) -> Option<PathBuf>,
{
    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, dest_root, filter),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_root, filter),
    }
}

/// Extracts the entries of a ZIP archive accepted by `filter`.
///
/// Returns the number of files written.
///
/// # Errors
///
/// Returns an error if:
/// - The archive cannot be opened or is not a valid ZIP file
/// - Any entry name escapes `dest_root` ([`ReleaseError::PathTraversal`])
/// - An output file cannot be created, written or synced
pub fn extract_zip<F>(archive_path: &Path, dest_root: &Path, mut filter: F) -> Result<usize>
where
    F: FnMut(&Path) -> Option<PathBuf>,
{
    let root = resolve_root(dest_root)?;

    let file =
        File::open(archive_path).map_err(|e| ReleaseError::io("open archive", archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ReleaseError::Zip {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|source| ReleaseError::Zip {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let name = PathBuf::from(entry.name());
        check_entry(&root, &name, entry.is_dir())?;

        if entry.is_dir() || entry.is_symlink() {
            continue;
        }

        let Some(renamed) = filter(&name) else {
            debug!(entry = %name.display(), "skipping archive entry");
            continue;
        };
        let output = contained_path(&root, &renamed)?;
        let mode = entry.unix_mode();
        write_entry(&mut entry, &output, mode)?;
        written += 1;
    }

    Ok(written)
}

/// Extracts the entries of a gzip-compressed tarball accepted by `filter`.
///
/// The archive is read sequentially, one entry at a time, until the end of
/// the stream. Returns the number of files written.
///
/// # Errors
///
/// Returns an error if:
/// - The archive cannot be opened, decompressed or read
/// - Any entry name escapes `dest_root` ([`ReleaseError::PathTraversal`])
/// - An output file cannot be created, written or synced
pub fn extract_tar_gz<F>(archive_path: &Path, dest_root: &Path, mut filter: F) -> Result<usize>
where
    F: FnMut(&Path) -> Option<PathBuf>,
{
    let root = resolve_root(dest_root)?;

    let file =
        File::open(archive_path).map_err(|e| ReleaseError::io("open archive", archive_path, e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| ReleaseError::io("read tar entries of", archive_path, e))?;

    let mut written = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| ReleaseError::io("read tar entry of", archive_path, e))?;

        let name = entry
            .path()
            .map_err(|e| ReleaseError::io("read tar entry name of", archive_path, e))?
            .into_owned();
        check_entry(&root, &name, entry.header().entry_type().is_dir())?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let Some(renamed) = filter(&name) else {
            debug!(entry = %name.display(), "skipping archive entry");
            continue;
        };
        let output = contained_path(&root, &renamed)?;
        let mode = entry.header().mode().ok();
        write_entry(&mut entry, &output, mode)?;
        written += 1;
    }

    Ok(written)
}

/// Makes `dest_root` absolute and lexically clean.
fn resolve_root(dest_root: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(dest_root)
        .map_err(|e| ReleaseError::io("resolve destination", dest_root, e))?;
    Ok(clean_path(&absolute))
}

/// Containment check for a stored entry name.
///
/// A directory entry naming the root itself (`./`) is allowed.
fn check_entry(root: &Path, name: &Path, is_dir: bool) -> Result<()> {
    if is_dir && clean_path(&root.join(name)) == root {
        return Ok(());
    }
    contained_path(root, name).map(drop)
}

/// Joins `name` onto `root` and checks the result lies strictly inside `root`.
fn contained_path(root: &Path, name: &Path) -> Result<PathBuf> {
    let candidate = clean_path(&root.join(name));
    if candidate != root && candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(ReleaseError::PathTraversal {
            entry: name.display().to_string(),
            root: root.to_path_buf(),
        })
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if cleaned.file_name().is_some() {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Streams one entry to `output`, then applies `mode` and syncs.
///
/// Permission bits are applied only once the content is synced.
fn write_entry(reader: &mut impl Read, output: &Path, mode: Option<u32>) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ReleaseError::io("create directory", parent, e))?;
    }

    let mut file = File::create(output).map_err(|e| ReleaseError::io("create", output, e))?;
    std::io::copy(reader, &mut file).map_err(|e| ReleaseError::io("write", output, e))?;
    file.flush().map_err(|e| ReleaseError::io("flush", output, e))?;
    file.sync_data().map_err(|e| ReleaseError::io("sync", output, e))?;

    apply_mode(&file, output, mode)?;

    file.sync_all().map_err(|e| ReleaseError::io("sync", output, e))
}

#[cfg(unix)]
fn apply_mode(file: &File, output: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        file.set_permissions(std::fs::Permissions::from_mode(mode & 0o777))
            .map_err(|e| ReleaseError::io("set permissions on", output, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn apply_mode(_file: &File, _output: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

/// Sets an installed executable to mode `0755`.
///
/// # Errors
///
/// Returns an error if the file's metadata cannot be read or its permissions
/// cannot be changed.
#[cfg(unix)]
pub fn set_executable_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| ReleaseError::io("read metadata of", path, e))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .map_err(|e| ReleaseError::io("set permissions on", path, e))
}

/// Windows has no executable bit; this only checks the file exists.
///
/// # Errors
///
/// Returns an error if the file's metadata cannot be read.
#[cfg(not(unix))]
pub fn set_executable_permissions(path: &Path) -> Result<()> {
    std::fs::metadata(path).map_err(|e| ReleaseError::io("read metadata of", path, e))?;
    Ok(())
}
