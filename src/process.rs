//! Subprocess invocation helpers.
//!
//! `Cmd` is a thin wrapper over `std::process::Command` that captures
//! output, maps non-zero exits to errors carrying a caller-supplied message,
//! and keeps the underlying tool's stderr in the error chain. Long-running
//! tools that should stream to the terminal use [`Cmd::run_interactive`].

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CmdResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Builder for external tool invocations.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.display().to_string());
        self
    }

    /// Message used when the command exits non-zero.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Return the captured result instead of failing on a non-zero exit.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Run with captured stdout/stderr.
    pub fn run(self) -> Result<CmdResult> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("failed to spawn '{}'", self.program))?;

        let result = CmdResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success && !self.allow_fail {
            bail!(
                "{}\n  command: {} {}\n  exit: {}\n  stderr: {}",
                self.failure_message(),
                self.program,
                self.args.join(" "),
                describe_code(result.code),
                result.stderr.trim()
            );
        }

        Ok(result)
    }

    /// Run with inherited stdio so the tool streams to the terminal.
    pub fn run_interactive(self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .with_context(|| format!("failed to spawn '{}'", self.program))?;

        if !status.success() && !self.allow_fail {
            bail!(
                "{}\n  command: {} {}\n  exit: {}",
                self.failure_message(),
                self.program,
                self.args.join(" "),
                describe_code(status.code())
            );
        }

        Ok(())
    }

    fn failure_message(&self) -> String {
        self.error_msg
            .clone()
            .unwrap_or_else(|| format!("'{}' failed", self.program))
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

/// Fail with a named-input error when `path` does not exist.
pub fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    bail!("{} not found at {}", what, path.display())
}
