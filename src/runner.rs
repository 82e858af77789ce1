//! External process execution.
//!
//! The engine is driven entirely through subprocesses. The [`ProcessRunner`]
//! trait is the seam: the pipeline only ever sees "run this command, put
//! its combined output in this log file, tell me the exit code", so tests
//! substitute a scripted runner and a future implementation can add a
//! timeout without touching callers. The default runner blocks until the
//! process exits; a hung commandlet hangs the pipeline.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::Result;

/// A fully resolved command line: program plus arguments, unescaped.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes an external command, streaming its combined stdout/stderr into
/// a log file, and reports the raw exit code.
pub trait ProcessRunner {
    fn run(&self, spec: &CommandSpec, log_path: &Path) -> Result<i32>;
}

/// Production runner backed by `std::process::Command`.
///
/// Stdout is read line-by-line and teed into the log file as it arrives
/// (the read blocks, so the process applies its own backpressure); stderr
/// is joined to the same file at the descriptor level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, log_path: &Path) -> Result<i32> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(command = %spec, log = %log_path.display(), "running");

        let mut log = File::create(log_path)?;
        let stderr_log = log.try_clone()?;

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(stderr_log))
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "child stdout not captured")
        })?;

        for line in BufReader::new(stdout).split(b'\n') {
            let line = line?;
            log.write_all(&line)?;
            log.write_all(b"\n")?;
        }

        let status = child.wait()?;
        let code = status.code().unwrap_or(-1);
        debug!(code, "process finished");

        Ok(code)
    }
}
