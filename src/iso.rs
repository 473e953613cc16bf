//! Hybrid ISO mastering and BIOS boot-sector installation.
//!
//! Wraps `xorriso -as mkisofs` for the hybrid BIOS+UEFI layout (Rock Ridge
//! and Joliet extensions, an HFS+ partition, two El Torito boot entries,
//! protective MBR) and the bootloader's own `bios-install` utility.
//!
//! xorriso reports diagnostics as `xorriso : SEVERITY : message`.
//! `SORRY`-class diagnostics are acceptable; `FAILURE` and worse are fatal.

use anyhow::{bail, Result};
use std::path::Path;

use crate::bootloader;
use crate::config::BuildConfig;
use crate::process::{ensure_exists, Cmd};

/// El Torito boot entry locations inside the staging tree.
const BIOS_CD_IMAGE: &str = "boot/limine/limine-bios-cd.bin";
const UEFI_CD_IMAGE: &str = "boot/limine/limine-uefi-cd.bin";

pub(crate) fn xorriso_args(iso_root: &Path, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-as",
        "mkisofs",
        "-R",
        "-r",
        "-J",
        "-b",
        BIOS_CD_IMAGE,
        "-no-emul-boot",
        "-boot-load-size",
        "4",
        "-boot-info-table",
        "-hfsplus",
        "-apm-block-size",
        "2048",
        "--efi-boot",
        UEFI_CD_IMAGE,
        "-efi-boot-part",
        "--efi-boot-image",
        "--protective-msdos-label",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(iso_root.display().to_string());
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args
}

/// Diagnostics above the tolerated `SORRY` class.
fn fatal_diagnostics(stderr: &str) -> Vec<&str> {
    stderr
        .lines()
        .filter(|line| {
            let mut parts = line.splitn(3, ':').map(str::trim);
            parts.next() == Some("xorriso")
                && matches!(parts.next(), Some("FAILURE") | Some("FATAL") | Some("ABORT"))
        })
        .collect()
}

/// Master the hybrid ISO from the staging tree.
pub fn master_iso(config: &BuildConfig) -> Result<()> {
    let iso_root = config.iso_root();
    let output = config.iso_path();

    println!("  Mastering hybrid ISO at {}...", output.display());
    let result = Cmd::new("xorriso")
        .args(&xorriso_args(&iso_root, &output))
        .allow_fail()
        .run()?;

    // xorriso writes its report to stderr; forward it unfiltered.
    for line in result.stderr.lines() {
        eprintln!("  {}", line);
    }

    if !result.success {
        let fatal = fatal_diagnostics(&result.stderr);
        if fatal.is_empty() {
            println!(
                "  [WARN] xorriso exited non-zero with only SORRY-class diagnostics; continuing"
            );
        } else {
            bail!("xorriso failed:\n{}", fatal.join("\n"));
        }
    }

    if !output.is_file() {
        bail!(
            "xorriso finished but the ISO is missing at {}",
            output.display()
        );
    }

    Ok(())
}

/// Patch BIOS boot sectors into the mastered ISO.
pub fn install_bios_boot_sectors(config: &BuildConfig) -> Result<()> {
    let iso = config.iso_path();
    ensure_exists(&iso, "ISO image")?;

    println!("  Installing BIOS boot sectors...");
    let installer = bootloader::installer_path(config);
    Cmd::new(installer.display().to_string())
        .arg("bios-install")
        .arg_path(&iso)
        .arg("--quiet")
        .error_msg("limine bios-install failed")
        .run()?;

    Ok(())
}
