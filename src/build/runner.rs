use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use crate::foundation::{
    error::{LapseError, LapseResult},
    process::{drain, join_drain, join_drain_within, kill_process_group, tail_lossy},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to wait for output pipes to close once a timed-out build has been killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// The build command as an explicit argument vector. No shell, no word splitting.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl BuildCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// First element is the program, the rest are its arguments.
    pub fn from_argv(argv: Vec<String>) -> LapseResult<Self> {
        let mut it = argv.into_iter();
        let program = it
            .next()
            .ok_or_else(|| LapseError::validation("build command must not be empty"))?;
        let cmd = Self::new(program, it);
        cmd.validate()?;
        Ok(cmd)
    }

    pub fn validate(&self) -> LapseResult<()> {
        if self.program.trim().is_empty() {
            return Err(LapseError::validation("build command must not be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What to do when the build exits non-zero or times out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFailurePolicy {
    /// Warn and render whatever artifact is on disk.
    #[default]
    Continue,
    /// Skip the revision without producing a frame.
    Skip,
    /// Stop the run with a build error.
    Abort,
}

/// Result of one build invocation that managed to start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub elapsed: Duration,
    /// Last lines of stderr, for diagnostics only.
    pub stderr_tail: String,
}

impl BuildOutcome {
    pub fn succeeded(elapsed: Duration) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            timed_out: false,
            elapsed,
            stderr_tail: String::new(),
        }
    }

    pub fn describe(&self) -> String {
        if self.timed_out {
            format!("timed out after {:.1}s", self.elapsed.as_secs_f64())
        } else {
            match self.exit_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            }
        }
    }
}

/// Produces the build artifact for whatever revision is checked out.
pub trait BuildRunner {
    /// Run the build once.
    ///
    /// `Err` means the command could not be run at all; a command that ran and failed is
    /// reported through [`BuildOutcome::success`].
    fn run(&mut self) -> LapseResult<BuildOutcome>;
}

/// Runs a [`BuildCommand`] as a child process in a fixed working directory.
#[derive(Clone, Debug)]
pub struct CommandBuildRunner {
    command: BuildCommand,
    cwd: PathBuf,
    timeout: Option<Duration>,
}

impl CommandBuildRunner {
    pub fn new(command: BuildCommand, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
            timeout: None,
        }
    }

    /// Kill the build if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &BuildCommand {
        &self.command
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl BuildRunner for CommandBuildRunner {
    fn run(&mut self) -> LapseResult<BuildOutcome> {
        tracing::info!(command = %self.command, cwd = %self.cwd.display(), "building");
        let started = Instant::now();

        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // A timed build leads its own process group so the kill reaches every descendant.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            if self.timeout.is_some() {
                cmd.process_group(0);
            }
        }
        let mut child = cmd
            .spawn()
            .map_err(|e| {
                LapseError::build(format!(
                    "failed to start `{}` in '{}': {e}",
                    self.command,
                    self.cwd.display()
                ))
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let wait_err = |e: std::io::Error| LapseError::build(format!("failed to wait for build: {e}"));
        let (status, timed_out): (ExitStatus, bool) = match self.timeout {
            None => (child.wait().map_err(wait_err)?, false),
            Some(limit) => loop {
                if let Some(status) = child.try_wait().map_err(wait_err)? {
                    break (status, false);
                }
                if started.elapsed() >= limit {
                    kill_process_group(child.id());
                    // The child may exit between try_wait and kill.
                    let _ = child.kill();
                    break (child.wait().map_err(wait_err)?, true);
                }
                std::thread::sleep(POLL_INTERVAL);
            },
        };

        let (stdout, stderr) = if timed_out {
            (
                join_drain_within(stdout, KILL_GRACE),
                join_drain_within(stderr, KILL_GRACE),
            )
        } else {
            (join_drain(stdout), join_drain(stderr))
        };
        if !stdout.is_empty() {
            tracing::debug!(stdout = %tail_lossy(&stdout, 20), "build output");
        }
        if !stderr.is_empty() {
            tracing::debug!(stderr = %tail_lossy(&stderr, 20), "build diagnostics");
        }

        let outcome = BuildOutcome {
            success: status.success() && !timed_out,
            exit_code: status.code(),
            timed_out,
            elapsed: started.elapsed(),
            stderr_tail: tail_lossy(&stderr, 20),
        };
        tracing::debug!(
            success = outcome.success,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "build finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/runner.rs"]
mod tests;
