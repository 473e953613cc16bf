//! ISO staging tree assembly.
//!
//! Copies into the staging tree follow a per-file refresh policy:
//! bootloader stage files and EFI stubs are copied only when absent (a
//! stale staged copy is kept), while the bootloader config and the kernel
//! binary are refreshed on every run. `clean` is the only way to drop a
//! kept stage file.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Outcome of an idempotent copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    KeptExisting,
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating directory '{}'", path.display()))
}

/// Copy `src` to `dst` only when `dst` does not already exist.
///
/// A kept destination whose content differs from the source is reported but
/// still kept.
pub fn copy_if_absent(src: &Path, dst: &Path) -> Result<CopyOutcome> {
    if dst.exists() {
        if file_sha256(src)? != file_sha256(dst)? {
            eprintln!(
                "  [WARN] staged {} differs from {}; keeping the staged copy (run `clean` to refresh)",
                dst.display(),
                src.display()
            );
        } else {
            println!("  [SKIP] {} already staged", dst.display());
        }
        return Ok(CopyOutcome::KeptExisting);
    }

    copy_file(src, dst)?;
    Ok(CopyOutcome::Copied)
}

/// Copy `src` to `dst` unconditionally, replacing any existing file.
pub fn copy_fresh(src: &Path, dst: &Path) -> Result<()> {
    copy_file(src, dst)
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .with_context(|| format!("copying '{}' to '{}'", src.display(), dst.display()))?;
    println!("  Staged {}", dst.display());
    Ok(())
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// File count and total bytes under the staging root.
pub fn tree_summary(root: &Path) -> Result<(usize, u64)> {
    let mut files = 0;
    let mut bytes = 0u64;
    for entry in walkdir::WalkDir::new(root) {
        let entry =
            entry.with_context(|| format!("walking staging tree '{}'", root.display()))?;
        if entry.file_type().is_file() {
            files += 1;
            bytes += entry
                .metadata()
                .with_context(|| format!("reading metadata for '{}'", entry.path().display()))?
                .len();
        }
    }
    Ok((files, bytes))
}
