//! Synchronous execution of external processes.
//!
//! Every operation goes through a [`ProcessRunner`], which makes it possible to
//! drive the whole pipeline without spawning anything (see the recording runners
//! in the tests). [`SystemRunner`] is the real one: it blocks until the child
//! exits, captures its output, and turns a nonzero exit status into
//! [`Error::ToolFailed`].

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::command::Invocation;
use crate::error::{Error, Result};

/// Outcome of a finished child process.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

pub trait ProcessRunner {
    /// Runs `inv` to completion.
    ///
    /// Returns `Err(ToolFailed)` when the process exits unsuccessfully.
    fn run(&self, inv: &Invocation) -> Result<RunOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, inv: &Invocation) -> Result<RunOutput> {
        (**self).run(inv)
    }
}

/// Spawns real processes. Echoes their output unless `echo` is cleared.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// Echo the captured stdout of each command to the log at `info` level.
    pub echo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self { echo: true }
    }
}

const BANNER_WIDTH: usize = 40;

impl ProcessRunner for SystemRunner {
    fn run(&self, inv: &Invocation) -> Result<RunOutput> {
        let program = inv.program().to_string_lossy().into_owned();
        info!("{}", inv);
        info!("{} CMD OUTPUT {}", "-".repeat(BANNER_WIDTH), "-".repeat(BANNER_WIDTH));

        let start = Instant::now();
        let output = inv
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;
        let duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stdout.lines() {
            if self.echo {
                info!("| {}", line);
            } else {
                debug!("| {}", line);
            }
        }
        for line in stderr.lines() {
            debug!("! {}", line);
        }
        info!(
            "{} CMD OUTPUT END ({:.3} s, {}) {}",
            "=".repeat(BANNER_WIDTH),
            duration.as_secs_f64(),
            output.status,
            "=".repeat(BANNER_WIDTH)
        );

        if !output.status.success() {
            return Err(Error::ToolFailed {
                program,
                status: output.status,
                stderr,
            });
        }
        Ok(RunOutput {
            status: output.status,
            stdout,
            stderr,
            duration,
        })
    }
}

/// A successful, silent run, for runners that fabricate tool output in tests.
#[cfg(test)]
pub(crate) fn fake_success() -> RunOutput {
    #[cfg(unix)]
    use std::os::unix::process::ExitStatusExt;
    #[cfg(windows)]
    use std::os::windows::process::ExitStatusExt;

    RunOutput {
        status: ExitStatus::from_raw(0),
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::ZERO,
    }
}

/// Records every invocation and spawns nothing.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Spy {
    pub calls: std::cell::RefCell<Vec<Invocation>>,
}

#[cfg(test)]
impl Spy {
    pub fn count(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[cfg(test)]
impl ProcessRunner for Spy {
    fn run(&self, inv: &Invocation) -> Result<RunOutput> {
        self.calls.borrow_mut().push(inv.clone());
        Ok(fake_success())
    }
}
