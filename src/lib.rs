//! Build-and-boot orchestration for a Limine-loaded kernel.
//!
//! This crate sequences the external tools that turn a prebuilt kernel
//! binary into a bootable hybrid BIOS/UEFI ISO and boot it under QEMU:
//!
//! - **Bootloader acquisition** - shallow clone and `make` of the Limine
//!   binary-release branch
//! - **Staging** - ISO tree assembly with a per-file refresh policy
//! - **Mastering** - `xorriso` hybrid ISO creation plus BIOS boot-sector
//!   installation via the bootloader's own installer
//! - **Launch** - QEMU with OVMF firmware flash drives and the ISO as
//!   optical media
//!
//! # Architecture
//!
//! ```text
//! image-builder run <kernel>
//!     │
//!     ├── preflight   - host tool and input validation
//!     ├── bootloader  - git clone (if absent) + make, artifact verification
//!     ├── stage       - boot/limine/, EFI/BOOT/, kernel copy
//!     ├── iso         - xorriso mastering, limine bios-install
//!     └── qemu        - blocking interactive launch
//! ```
//!
//! Every step is a plain `Result`-returning function; the pipeline stops at
//! the first failure and the error chain names the failing step and tool.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use image_builder::{pipeline, BuildConfig};
//!
//! let config = BuildConfig::load(None)?;
//! pipeline::run(&config, Path::new("kernel.bin"))?;
//! ```

pub mod bootloader;
pub mod config;
pub mod iso;
pub mod manifest;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod qemu;
pub mod stage;

pub use config::BuildConfig;
pub use pipeline::{clean, run};
