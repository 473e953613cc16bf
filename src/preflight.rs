//! Preflight checks for host validation.
//!
//! Validates that the host has the required external tools before a build
//! starts. This prevents cryptic mid-sequence subprocess errors.
//!
//! # Example
//!
//! ```rust
//! use image_builder::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("xorriso") {
//!     println!("xorriso not installed");
//! }
//!
//! let tools = &[("xorriso", "xorriso"), ("git", "git")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Host tools the run operation invokes.
///
/// Each tuple is (command_name, package_name). The bootloader's own
/// installer is not listed; it is produced by the bootloader build.
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("git", "git"),
    ("make", "make"),
    ("xorriso", "xorriso"),
    ("qemu-system-x86_64", "qemu-system-x86"),
];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` listing every missing tool and its package
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check all tools in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}
