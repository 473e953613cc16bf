//! QEMU launch for mastered ISO images.
//!
//! Provides `QemuBuilder` for constructing the `qemu-system-x86_64`
//! invocation: machine profile, memory size, OVMF firmware mapped as two
//! pflash drives (code read-only on unit 0, vars writable on unit 1), and
//! the ISO as optical media. The launch is interactive and blocks until the
//! user closes the emulator.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::config::BuildConfig;

/// Builder for QEMU commands.
#[derive(Default)]
pub struct QemuBuilder {
    machine: String,
    memory_gb: u32,
    firmware_code: Option<PathBuf>,
    firmware_vars: Option<PathBuf>,
    cdrom: Option<PathBuf>,
}

impl QemuBuilder {
    pub fn new(machine: &str, memory_gb: u32) -> Self {
        Self {
            machine: machine.to_string(),
            memory_gb,
            ..Default::default()
        }
    }

    pub fn firmware(mut self, code: PathBuf, vars: PathBuf) -> Self {
        self.firmware_code = Some(code);
        self.firmware_vars = Some(vars);
        self
    }

    pub fn cdrom(mut self, iso: PathBuf) -> Self {
        self.cdrom = Some(iso);
        self
    }

    pub fn build(self) -> Command {
        let mut cmd = Command::new("qemu-system-x86_64");

        cmd.args(["-M", &self.machine]);
        cmd.args(["-m", &format!("{}G", self.memory_gb)]);

        // Firmware code is immutable; vars persist firmware settings.
        if let Some(code) = &self.firmware_code {
            cmd.args([
                "-drive",
                &format!(
                    "if=pflash,unit=0,format=raw,readonly=on,file={}",
                    code.display()
                ),
            ]);
        }
        if let Some(vars) = &self.firmware_vars {
            cmd.args([
                "-drive",
                &format!("if=pflash,unit=1,format=raw,file={}", vars.display()),
            ]);
        }

        if let Some(cdrom) = &self.cdrom {
            cmd.arg("-cdrom");
            cmd.arg(cdrom);
        }

        cmd
    }
}

/// Launch QEMU on the configured ISO and block until it exits.
pub fn launch(config: &BuildConfig) -> Result<()> {
    println!("Launching QEMU (close the emulator to return)...");

    let mut cmd = QemuBuilder::new(&config.qemu_machine, config.qemu_memory_gb)
        .firmware(config.firmware_code.clone(), config.firmware_vars.clone())
        .cdrom(config.iso_path())
        .build();

    let status = cmd.status().context("failed to spawn qemu-system-x86_64")?;
    if !status.success() {
        bail!("qemu-system-x86_64 exited with {}", status);
    }

    Ok(())
}
