//! Build configuration.
//!
//! All paths and tool parameters live in one [`BuildConfig`] passed
//! explicitly into each operation. Values come from `image-builder.toml`
//! when present; every field has a default matching the standard repository
//! layout, so the tool runs with no config file at all.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given.
pub const CONFIG_FILENAME: &str = "image-builder.toml";

/// Paths and parameters for one build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Disposable output tree; `clean` removes it in full.
    pub output_dir: PathBuf,
    /// File name of the mastered ISO inside `output_dir`.
    pub iso_filename: String,
    /// OVMF firmware code image (mapped read-only).
    pub firmware_code: PathBuf,
    /// OVMF firmware vars image (mapped writable).
    pub firmware_vars: PathBuf,
    /// Bootloader checkout directory; reused across invocations.
    pub bootloader_dir: PathBuf,
    pub bootloader_repo: String,
    pub bootloader_branch: String,
    /// Bootloader config file, consumed as opaque bytes.
    pub bootloader_config: PathBuf,
    pub qemu_machine: String,
    pub qemu_memory_gb: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("target/image"),
            iso_filename: "image.iso".to_string(),
            firmware_code: PathBuf::from("ovmf/ovmf-code-x86_64.fd"),
            firmware_vars: PathBuf::from("ovmf/ovmf-vars-x86_64.fd"),
            bootloader_dir: PathBuf::from("limine"),
            bootloader_repo: "https://github.com/limine-bootloader/limine".to_string(),
            bootloader_branch: "v8.x-binary".to_string(),
            bootloader_config: PathBuf::from("limine.conf"),
            qemu_machine: "q35".to_string(),
            qemu_memory_gb: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageBuilderToml {
    image: Option<ImageToml>,
    bootloader: Option<BootloaderToml>,
    firmware: Option<FirmwareToml>,
    qemu: Option<QemuToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageToml {
    output_dir: Option<String>,
    iso_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BootloaderToml {
    dir: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    config_file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FirmwareToml {
    code: Option<String>,
    vars: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QemuToml {
    machine: Option<String>,
    memory_gb: Option<u32>,
}

impl BuildConfig {
    /// Load from an explicit path, or from `image-builder.toml` in the
    /// working directory when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(CONFIG_FILENAME);
                if default_path.is_file() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let parsed: ImageBuilderToml = toml::from_str(&raw)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        Ok(Self::from_toml(parsed))
    }

    fn from_toml(parsed: ImageBuilderToml) -> Self {
        let mut config = Self::default();

        if let Some(image) = parsed.image {
            if let Some(output_dir) = image.output_dir {
                config.output_dir = PathBuf::from(output_dir);
            }
            if let Some(iso_filename) = image.iso_filename {
                config.iso_filename = iso_filename;
            }
        }
        if let Some(bootloader) = parsed.bootloader {
            if let Some(dir) = bootloader.dir {
                config.bootloader_dir = PathBuf::from(dir);
            }
            if let Some(repo) = bootloader.repo {
                config.bootloader_repo = repo;
            }
            if let Some(branch) = bootloader.branch {
                config.bootloader_branch = branch;
            }
            if let Some(config_file) = bootloader.config_file {
                config.bootloader_config = PathBuf::from(config_file);
            }
        }
        if let Some(firmware) = parsed.firmware {
            if let Some(code) = firmware.code {
                config.firmware_code = PathBuf::from(code);
            }
            if let Some(vars) = firmware.vars {
                config.firmware_vars = PathBuf::from(vars);
            }
        }
        if let Some(qemu) = parsed.qemu {
            if let Some(machine) = qemu.machine {
                config.qemu_machine = machine;
            }
            if let Some(memory_gb) = qemu.memory_gb {
                config.qemu_memory_gb = memory_gb;
            }
        }

        config
    }

    /// Root of the staging tree mirroring the ISO's layout.
    pub fn iso_root(&self) -> PathBuf {
        self.output_dir.join("iso_root")
    }

    pub fn iso_path(&self) -> PathBuf {
        self.output_dir.join(&self.iso_filename)
    }

    pub fn boot_dir(&self) -> PathBuf {
        self.iso_root().join("boot")
    }

    /// Staging subdirectory for the bootloader stage files and its config.
    pub fn boot_limine_dir(&self) -> PathBuf {
        self.boot_dir().join("limine")
    }

    /// Standard UEFI default boot stub directory on the ISO.
    pub fn efi_boot_dir(&self) -> PathBuf {
        self.iso_root().join("EFI/BOOT")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join("run-manifest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_standard_layout() {
        let config = BuildConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("target/image"));
        assert_eq!(config.bootloader_branch, "v8.x-binary");
        assert_eq!(config.qemu_machine, "q35");
        assert_eq!(config.qemu_memory_gb, 1);
    }

    #[test]
    fn derived_paths_follow_output_dir() {
        let config = BuildConfig::default();
        assert_eq!(config.iso_root(), PathBuf::from("target/image/iso_root"));
        assert_eq!(config.iso_path(), PathBuf::from("target/image/image.iso"));
        assert_eq!(
            config.boot_limine_dir(),
            PathBuf::from("target/image/iso_root/boot/limine")
        );
        assert_eq!(
            config.efi_boot_dir(),
            PathBuf::from("target/image/iso_root/EFI/BOOT")
        );
    }

    #[test]
    fn from_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[image]\noutput_dir = \"out\"\n\n[bootloader]\nbranch = \"v9.x-binary\"\n"
        )
        .unwrap();

        let config = BuildConfig::from_file(file.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.bootloader_branch, "v9.x-binary");
        // Untouched sections keep their defaults.
        assert_eq!(config.iso_filename, "image.iso");
        assert_eq!(config.qemu_machine, "q35");
    }

    #[test]
    fn from_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[image]\noutput_directory = \"out\"\n").unwrap();

        let err = BuildConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }
}
