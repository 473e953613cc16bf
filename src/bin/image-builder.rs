use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use image_builder::{bootloader, pipeline, BuildConfig};

fn usage() -> &'static str {
    "Usage:\n  image-builder [--config <file>] acquire-bootloader\n  image-builder [--config <file>] clean\n  image-builder [--config <file>] run <kernel-binary>"
}

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            bail!(usage());
        }
        config_path = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let config = BuildConfig::load(config_path.as_deref())?;

    match args.as_slice() {
        [cmd] if cmd == "acquire-bootloader" => bootloader::acquire(&config),
        [cmd] if cmd == "clean" => pipeline::clean(&config),
        [cmd, kernel] if cmd == "run" => pipeline::run(&config, Path::new(kernel)),
        _ => bail!(usage()),
    }
}
