//! Operation orchestration.
//!
//! Sequences the `clean` and `run` operations. Every step returns a
//! `Result` and the sequence stops at the first failure; the error chain
//! names the failing step and the underlying tool. Nothing is retried and
//! nothing is rolled back.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::BuildConfig;
use crate::process::ensure_exists;
use crate::{bootloader, iso, manifest, preflight, qemu, stage};

/// Remove the output directory tree. Succeeds when it is already absent.
pub fn clean(config: &BuildConfig) -> Result<()> {
    if !config.output_dir.exists() {
        println!(
            "[SKIP] output directory {} already absent",
            config.output_dir.display()
        );
        return Ok(());
    }

    fs::remove_dir_all(&config.output_dir).with_context(|| {
        format!(
            "removing output directory '{}'",
            config.output_dir.display()
        )
    })?;
    println!("Removed {}", config.output_dir.display());
    Ok(())
}

/// Build the ISO around `kernel` and launch it under QEMU.
pub fn run(config: &BuildConfig, kernel: &Path) -> Result<()> {
    ensure_exists(kernel, "kernel binary")?;
    ensure_exists(&config.firmware_code, "firmware code image")?;
    ensure_exists(&config.firmware_vars, "firmware vars image")?;
    preflight::check_host_tools()?;

    if let Some(previous) = manifest::load_manifest(&config.manifest_path())? {
        println!(
            "Previous ISO built at {} from {}",
            previous.created_at_utc, previous.kernel
        );
    }

    bootloader::acquire(config)?;
    assemble_staging(config, kernel)?;

    let (files, bytes) = stage::tree_summary(&config.iso_root())?;
    println!("  Staged {} files ({} bytes)", files, bytes);

    iso::master_iso(config)?;
    iso::install_bios_boot_sectors(config)?;

    let iso_path = config.iso_path();
    let iso_bytes = fs::metadata(&iso_path)
        .with_context(|| format!("reading metadata for '{}'", iso_path.display()))?
        .len();
    manifest::write_manifest(
        &config.manifest_path(),
        &manifest::RunManifest {
            created_at_utc: manifest::now_utc_compact(),
            kernel: kernel.display().to_string(),
            iso: iso_path.display().to_string(),
            iso_bytes,
        },
    )?;
    println!("ISO ready at {} ({} bytes)", iso_path.display(), iso_bytes);

    qemu::launch(config)
}

/// Assemble the staging tree mirroring the ISO layout.
///
/// Stage files and EFI stubs are idempotent copies; the bootloader config
/// and the kernel binary are refreshed every run.
fn assemble_staging(config: &BuildConfig, kernel: &Path) -> Result<()> {
    println!(
        "Assembling ISO staging tree at {}...",
        config.iso_root().display()
    );

    let limine_dir = config.boot_limine_dir();
    stage::ensure_dir(&limine_dir)?;
    for name in bootloader::STAGE_FILES {
        stage::copy_if_absent(&config.bootloader_dir.join(name), &limine_dir.join(name))?;
    }

    let conf_name = config.bootloader_config.file_name().ok_or_else(|| {
        anyhow!(
            "bootloader config path '{}' has no file name",
            config.bootloader_config.display()
        )
    })?;
    stage::copy_fresh(&config.bootloader_config, &limine_dir.join(conf_name))?;

    let efi_dir = config.efi_boot_dir();
    stage::ensure_dir(&efi_dir)?;
    for name in bootloader::EFI_STAGE_FILES {
        stage::copy_if_absent(&config.bootloader_dir.join(name), &efi_dir.join(name))?;
    }

    let kernel_name = kernel
        .file_name()
        .ok_or_else(|| anyhow!("kernel path '{}' has no file name", kernel.display()))?;
    stage::copy_fresh(kernel, &config.boot_dir().join(kernel_name))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Config rooted in a temp dir with a fully populated fake checkout.
    fn fixture() -> (TempDir, BuildConfig, PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        let checkout = root.join("limine");
        fs::create_dir_all(&checkout).unwrap();
        for name in bootloader::STAGE_FILES.iter().chain(bootloader::EFI_STAGE_FILES) {
            fs::write(checkout.join(name), format!("artifact {}", name)).unwrap();
        }
        fs::write(checkout.join(bootloader::INSTALLER_BIN), b"installer").unwrap();

        let conf = root.join("limine.conf");
        fs::write(&conf, b"timeout: 3\n").unwrap();

        let kernel = root.join("kernel.bin");
        fs::write(&kernel, b"ELF kernel v1").unwrap();

        let config = BuildConfig {
            output_dir: root.join("target/image"),
            bootloader_dir: checkout,
            bootloader_config: conf,
            ..BuildConfig::default()
        };
        (temp, config, kernel)
    }

    #[test]
    fn clean_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig {
            output_dir: temp.path().join("target/image"),
            ..BuildConfig::default()
        };

        // Absent directory is a success, twice in a row.
        clean(&config).unwrap();
        clean(&config).unwrap();

        fs::create_dir_all(config.output_dir.join("iso_root/boot")).unwrap();
        clean(&config).unwrap();
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn run_aborts_on_missing_kernel() {
        let (_temp, config, _kernel) = fixture();

        let err = run(&config, Path::new("/nonexistent/kernel.bin")).unwrap_err();
        assert!(err.to_string().contains("kernel binary"));
        // Nothing was staged or mastered.
        assert!(!config.iso_root().exists());
        assert!(!config.iso_path().exists());
    }

    #[test]
    fn staging_lays_out_the_iso_tree() {
        let (_temp, config, kernel) = fixture();

        assemble_staging(&config, &kernel).unwrap();

        assert!(config.boot_limine_dir().join("limine-bios.sys").is_file());
        assert!(config.boot_limine_dir().join("limine-bios-cd.bin").is_file());
        assert!(config.boot_limine_dir().join("limine-uefi-cd.bin").is_file());
        assert!(config.boot_limine_dir().join("limine.conf").is_file());
        assert!(config.efi_boot_dir().join("BOOTX64.EFI").is_file());
        assert!(config.efi_boot_dir().join("BOOTIA32.EFI").is_file());
        assert!(config.boot_dir().join("kernel.bin").is_file());
    }

    #[test]
    fn restaging_keeps_stage_files_and_refreshes_kernel_and_config() {
        let (_temp, config, kernel) = fixture();
        assemble_staging(&config, &kernel).unwrap();

        // Simulate a rebuilt bootloader and an edited config and kernel.
        fs::write(
            config.bootloader_dir.join("limine-bios.sys"),
            b"rebuilt stage",
        )
        .unwrap();
        fs::write(&config.bootloader_config, b"timeout: 0\n").unwrap();
        fs::write(&kernel, b"ELF kernel v2").unwrap();

        assemble_staging(&config, &kernel).unwrap();

        // Stage file kept, config and kernel refreshed.
        assert_eq!(
            fs::read(config.boot_limine_dir().join("limine-bios.sys")).unwrap(),
            b"artifact limine-bios.sys"
        );
        assert_eq!(
            fs::read(config.boot_limine_dir().join("limine.conf")).unwrap(),
            b"timeout: 0\n"
        );
        assert_eq!(
            fs::read(config.boot_dir().join("kernel.bin")).unwrap(),
            b"ELF kernel v2"
        );
    }
}
