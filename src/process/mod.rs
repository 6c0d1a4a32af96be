//! Subprocess execution behind a replaceable seam.
//!
//! Installers never spawn processes directly; they go through a [`ProcessRunner`]
//! so detection and planning can be exercised against scripted output.

use std::io;
use std::process::Command;
use std::time::Instant;

/// Captured result of one subprocess invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful result carrying `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with exit code `code`.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a command line and captures its output.
pub trait ProcessRunner {
    /// Run `argv` (program followed by arguments) to completion.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the program cannot be found or spawned. A
    /// non-zero exit is reported through [`ProcessOutput::status`], not as an error.
    fn run(&self, argv: &[String]) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] spawning real processes, locating programs with `which`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> io::Result<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;

        let resolved = which::which(program)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("{program}: {e}")))?;

        tracing::debug!(target: "process", "Executing: {}", argv.join(" "));
        let start = Instant::now();
        let output = Command::new(resolved).args(args).output()?;
        tracing::debug!(
            target: "process",
            "{} exited with {:?} after {}ms",
            program,
            output.status.code(),
            start.elapsed().as_millis()
        );

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() && !stderr.trim().is_empty() {
            tracing::debug!(target: "process", "Error output: {}", stderr.trim());
        }

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}
