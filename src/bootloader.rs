//! Bootloader acquisition.
//!
//! Ensures a built Limine toolkit exists at the configured checkout
//! directory: shallow single-branch clone when the directory is absent,
//! `make` against the checkout afterward. The binary-release branch ships
//! prebuilt stages, so the build is a cheap no-op when nothing changed.
//!
//! The checkout, once cloned, is reused as-is across invocations; there is
//! no fetch and no branch verification on subsequent runs.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::process::Cmd;

/// Stage files copied into `boot/limine/` on the ISO.
pub const STAGE_FILES: &[&str] = &[
    "limine-bios.sys",
    "limine-bios-cd.bin",
    "limine-uefi-cd.bin",
];

/// EFI boot stubs copied into `EFI/BOOT/` on the ISO.
pub const EFI_STAGE_FILES: &[&str] = &["BOOTX64.EFI", "BOOTIA32.EFI"];

/// Host-side installer executable produced by the checkout's build.
pub const INSTALLER_BIN: &str = "limine";

/// Outcome of the checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    AlreadyPresent,
    ClonedNow,
}

/// Clone the bootloader repository unless the checkout already exists.
pub fn ensure_checkout(config: &BuildConfig) -> Result<CheckoutOutcome> {
    if config.bootloader_dir.exists() {
        println!(
            "  [SKIP] bootloader checkout exists at {}",
            config.bootloader_dir.display()
        );
        return Ok(CheckoutOutcome::AlreadyPresent);
    }

    println!(
        "  Cloning {} (branch {})...",
        config.bootloader_repo, config.bootloader_branch
    );
    Cmd::new("git")
        .args(["clone", &config.bootloader_repo])
        .arg_path(&config.bootloader_dir)
        .args(["--branch", &config.bootloader_branch, "--depth", "1"])
        .error_msg("git clone failed. Check network access and the branch name.")
        .run_interactive()?;

    Ok(CheckoutOutcome::ClonedNow)
}

/// Run the checkout's own build.
pub fn build(config: &BuildConfig) -> Result<()> {
    println!("  Building bootloader toolkit...");
    Cmd::new("make")
        .arg("-C")
        .arg_path(&config.bootloader_dir)
        .error_msg("bootloader build failed")
        .run_interactive()
}

/// Full acquisition: clone if absent, build, verify the named artifacts.
pub fn acquire(config: &BuildConfig) -> Result<()> {
    println!("Acquiring bootloader...");
    ensure_checkout(config)?;
    build(config)?;
    verify_artifacts(config)
}

/// Path of the `limine` installer inside the checkout.
pub fn installer_path(config: &BuildConfig) -> PathBuf {
    config.bootloader_dir.join(INSTALLER_BIN)
}

/// Confirm every artifact the run operation consumes exists in the checkout.
pub fn verify_artifacts(config: &BuildConfig) -> Result<()> {
    let mut missing = Vec::new();
    for name in STAGE_FILES
        .iter()
        .chain(EFI_STAGE_FILES.iter())
        .chain(std::iter::once(&INSTALLER_BIN))
    {
        let path = config.bootloader_dir.join(name);
        if !path.is_file() {
            missing.push(path);
        }
    }

    if missing.is_empty() {
        return Ok(());
    }

    bail!(
        "bootloader checkout at {} is missing expected artifacts:\n{}",
        config.bootloader_dir.display(),
        missing
            .iter()
            .map(|p| format!("  {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_with_checkout(dir: &TempDir) -> BuildConfig {
        BuildConfig {
            bootloader_dir: dir.path().to_path_buf(),
            ..BuildConfig::default()
        }
    }

    #[test]
    fn existing_checkout_skips_clone() {
        let temp = TempDir::new().unwrap();
        let config = config_with_checkout(&temp);

        let outcome = ensure_checkout(&config).unwrap();
        assert_eq!(outcome, CheckoutOutcome::AlreadyPresent);
    }

    #[test]
    fn verify_artifacts_accepts_complete_checkout() {
        let temp = TempDir::new().unwrap();
        for name in STAGE_FILES.iter().chain(EFI_STAGE_FILES.iter()) {
            fs::write(temp.path().join(name), b"stage").unwrap();
        }
        fs::write(temp.path().join(INSTALLER_BIN), b"installer").unwrap();

        let config = config_with_checkout(&temp);
        assert!(verify_artifacts(&config).is_ok());
    }

    #[test]
    fn verify_artifacts_lists_every_missing_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("limine-bios.sys"), b"stage").unwrap();

        let config = config_with_checkout(&temp);
        let err = verify_artifacts(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("limine-bios-cd.bin"));
        assert!(message.contains("BOOTX64.EFI"));
        assert!(message.contains(INSTALLER_BIN));
        // The one present file must not be reported missing.
        assert!(!message.contains("limine-bios.sys"));
    }
}
