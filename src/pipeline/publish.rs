//! Moving vendor trees between the project and the packages layer
//!
//! The layer is the single source of truth for installed packages. The
//! project sees it through a symlink at its vendor path.

use crate::error::{ComposerError, ComposerResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// What currently occupies the project's vendor path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorState {
    Absent,
    /// A link, typically left by an earlier publish
    Symlink,
    /// A real directory, e.g. vendored packages committed to the app
    Directory,
    /// A regular file or anything else
    Other,
}

/// Inspect a path without following symlinks
pub async fn inspect(path: &Path) -> ComposerResult<VendorState> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.file_type().is_symlink() => Ok(VendorState::Symlink),
        Ok(meta) if meta.is_dir() => Ok(VendorState::Directory),
        Ok(_) => Ok(VendorState::Other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(VendorState::Absent),
        Err(e) => Err(ComposerError::io(format!("inspecting {}", path.display()), e)),
    }
}

/// Seed the staging vendor directory with a pre-existing project tree.
///
/// Copies every entry of `visible` into `staging_vendor`, then removes
/// `visible`. A stale symlink is removed without copying. Returns whether
/// anything was adopted.
pub async fn adopt_existing(visible: &Path, staging_vendor: &Path) -> ComposerResult<bool> {
    match inspect(visible).await? {
        VendorState::Absent => Ok(false),
        VendorState::Symlink => {
            remove_link(visible).await?;
            Ok(false)
        }
        VendorState::Other => Err(ComposerError::PublishConflict {
            path: visible.to_path_buf(),
        }),
        VendorState::Directory => {
            let copied = copy_dir(visible, staging_vendor).await?;
            debug!(
                "Adopted {} entries from {} into {}",
                copied,
                visible.display(),
                staging_vendor.display()
            );
            tokio::fs::remove_dir_all(visible)
                .await
                .map_err(|e| ComposerError::io(format!("removing {}", visible.display()), e))?;
            Ok(true)
        }
    }
}

/// Remove whatever is at the vendor path so a cached layer can be
/// published over it. Returns whether a real directory was discarded.
pub async fn discard_existing(visible: &Path) -> ComposerResult<bool> {
    match inspect(visible).await? {
        VendorState::Absent => Ok(false),
        VendorState::Symlink => {
            remove_link(visible).await?;
            Ok(false)
        }
        VendorState::Directory => {
            tokio::fs::remove_dir_all(visible)
                .await
                .map_err(|e| ComposerError::io(format!("removing {}", visible.display()), e))?;
            Ok(true)
        }
        VendorState::Other => Err(ComposerError::PublishConflict {
            path: visible.to_path_buf(),
        }),
    }
}

/// How the staging directory was exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMethod {
    Symlink,
    Copy,
}

/// Expose `staging_vendor` at `visible`.
///
/// A stale symlink is replaced. A real directory at `visible` means
/// adoption did not run first and is reported as a conflict.
pub async fn publish(staging_vendor: &Path, visible: &Path) -> ComposerResult<PublishMethod> {
    tokio::fs::create_dir_all(staging_vendor).await.map_err(|e| {
        ComposerError::io(format!("creating {}", staging_vendor.display()), e)
    })?;

    match inspect(visible).await? {
        VendorState::Absent => {}
        VendorState::Symlink => remove_link(visible).await?,
        VendorState::Directory | VendorState::Other => {
            return Err(ComposerError::PublishConflict {
                path: visible.to_path_buf(),
            })
        }
    }

    if let Some(parent) = visible.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ComposerError::io(format!("creating {}", parent.display()), e))?;
    }

    link_or_copy(staging_vendor, visible).await
}

#[cfg(unix)]
async fn link_or_copy(staging_vendor: &Path, visible: &Path) -> ComposerResult<PublishMethod> {
    tokio::fs::symlink(staging_vendor, visible)
        .await
        .map_err(|e| {
            ComposerError::io(
                format!(
                    "linking {} -> {}",
                    visible.display(),
                    staging_vendor.display()
                ),
                e,
            )
        })?;
    Ok(PublishMethod::Symlink)
}

#[cfg(not(unix))]
async fn link_or_copy(staging_vendor: &Path, visible: &Path) -> ComposerResult<PublishMethod> {
    copy_dir(staging_vendor, visible).await?;
    Ok(PublishMethod::Copy)
}

async fn remove_link(path: &Path) -> ComposerResult<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| ComposerError::io(format!("removing link {}", path.display()), e))
}

/// Recursively copy `src` into `dst`, keeping symlinks as symlinks.
/// Returns the number of entries copied.
pub async fn copy_dir(src: &Path, dst: &Path) -> ComposerResult<usize> {
    let (src, dst): (PathBuf, PathBuf) = (src.to_path_buf(), dst.to_path_buf());
    let context = format!("copying {} to {}", src.display(), dst.display());

    tokio::task::spawn_blocking(move || copy_dir_blocking(&src, &dst))
        .await
        .map_err(|e| ComposerError::Internal(format!("copy task failed: {}", e)))?
        .map_err(|e| ComposerError::io(context, e))
}

fn copy_dir_blocking(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
        copied += 1;
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
