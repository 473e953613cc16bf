//! Run manifest records.
//!
//! Each successful ISO build writes `run-manifest.json` into the output
//! directory: when it was built, from which kernel, and how large the ISO
//! came out. The manifest lives inside the disposable output tree, so
//! `clean` removes it with everything else.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub created_at_utc: String,
    pub kernel: String,
    pub iso: String,
    pub iso_bytes: u64,
}

pub fn now_utc_compact() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    write_json_atomic(path, manifest)
        .with_context(|| format!("writing run manifest '{}'", path.display()))
}

/// `None` when no manifest exists yet.
pub fn load_manifest(path: &Path) -> Result<Option<RunManifest>> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes =
        fs::read(path).with_context(|| format!("reading run manifest '{}'", path.display()))?;
    let parsed = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing run manifest '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("path without parent '{}'", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("creating parent directory '{}'", parent.display()))?;
    let tmp = path.with_extension(format!("tmp-{}", std::process::id()));
    let payload = serde_json::to_vec_pretty(value).with_context(|| "serializing run manifest")?;
    fs::write(&tmp, payload).with_context(|| format!("writing temp file '{}'", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        format!(
            "renaming temp file '{}' to '{}'",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_returns_none_without_manifest() {
        let temp = TempDir::new().unwrap();
        let loaded = load_manifest(&temp.path().join("run-manifest.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn write_then_load_preserves_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run-manifest.json");
        let manifest = RunManifest {
            created_at_utc: now_utc_compact(),
            kernel: "kernel.bin".to_string(),
            iso: "target/image/image.iso".to_string(),
            iso_bytes: 1_474_560,
        };

        write_manifest(&path, &manifest).unwrap();
        let loaded = load_manifest(&path).unwrap().unwrap();

        assert_eq!(loaded.kernel, "kernel.bin");
        assert_eq!(loaded.iso_bytes, 1_474_560);
        // No temp file left behind after the atomic rename.
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn timestamp_is_compact_utc() {
        let stamp = now_utc_compact();
        assert_eq!(stamp.len(), 16);
        assert!(stamp.ends_with('Z'));
        assert!(stamp.contains('T'));
    }
}
