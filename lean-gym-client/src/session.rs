//! Detached `screen` sessions running the lean-gym REPL.
//!
//! The REPL runs inside a logged, detached `screen` session. Input is typed
//! into the session with `screen -X stuff`, output is captured by screen's
//! logging into a temporary file owned by the [`Session`].
//!
//! Sends are fire-and-forget: screen accepting the keystrokes says nothing
//! about whether the REPL consumed them. The only delivery signal is a
//! response line eventually showing up in the log.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use tempfile::{NamedTempFile, TempPath};

use crate::config::LeanGymConfig;
use crate::error::{Error, Result};

/// Everything needed to launch one REPL session.
#[derive(Debug, Clone, Copy)]
pub struct LaunchSpec<'a> {
    pub session_name: &'a str,
    pub log_path: &'a Path,
    pub working_dir: &'a Path,
    pub program: &'a str,
    pub args: &'a [String],
}

/// A terminal multiplexer able to host a detached REPL session.
pub trait Multiplexer: Send + Sync {
    /// Start a detached session logging to `spec.log_path`.
    fn launch(&self, spec: &LaunchSpec<'_>) -> Result<()>;

    /// Type `keys` into the session. No acknowledgment is expected.
    fn send(&self, session_name: &str, keys: &str) -> Result<()>;

    /// Ask the session to quit. Does not wait for the REPL to exit.
    fn quit(&self, session_name: &str) -> Result<()>;
}

/// GNU screen.
#[derive(Debug, Clone, Default)]
pub struct Screen {
    binary: Option<PathBuf>,
}

impl Screen {
    /// Use `binary`, or look `screen` up in PATH when None.
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    pub fn from_config(config: &LeanGymConfig) -> Self {
        Self::new(config.multiplexer_path.clone())
    }

    /// Resolve the screen executable.
    fn binary(&self) -> Result<PathBuf> {
        // Accepts a bare command name as well as a path.
        if let Some(ref path) = self.binary {
            return which::which(path).map_err(|_| {
                Error::Config(format!(
                    "screen (terminal command) is not found at {}",
                    path.display()
                ))
            });
        }

        which::which("screen").map_err(|_| {
            Error::Config(
                "screen (terminal command) is not found. Set LEAN_GYM_SCREEN or install screen."
                    .to_string(),
            )
        })
    }

    fn run(&self, mut cmd: Command, action: &str) -> Result<Output> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("screen (terminal command) is not found: {}", e))
            } else {
                Error::SubprocessComm(format!("Failed to run screen ({action}): {e}"))
            }
        })
    }

    fn command(&self) -> Result<Command> {
        Ok(Command::new(self.binary()?))
    }
}

fn stderr_excerpt(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        let excerpt: String = stderr.chars().take(500).collect();
        format!("; stderr: {excerpt}")
    }
}

impl Multiplexer for Screen {
    fn launch(&self, spec: &LaunchSpec<'_>) -> Result<()> {
        let mut cmd = self.command()?;
        cmd.arg("-Logfile")
            .arg(spec.log_path)
            .arg("-dmSL")
            .arg(spec.session_name)
            .arg(spec.program)
            .args(spec.args)
            .current_dir(spec.working_dir);

        let output = self.run(cmd, "launch")?;
        if !output.status.success() {
            return Err(Error::SubprocessComm(format!(
                "screen failed to start session {} ({}){}",
                spec.session_name,
                output.status,
                stderr_excerpt(&output)
            )));
        }
        Ok(())
    }

    fn send(&self, session_name: &str, keys: &str) -> Result<()> {
        let mut cmd = self.command()?;
        cmd.arg("-S").arg(session_name).arg("-X").arg("stuff").arg(keys);

        let output = self.run(cmd, "stuff")?;
        if !output.status.success() {
            tracing::warn!(
                session = session_name,
                status = %output.status,
                "screen stuff exited unsuccessfully{}",
                stderr_excerpt(&output)
            );
        }
        Ok(())
    }

    fn quit(&self, session_name: &str) -> Result<()> {
        let mut cmd = self.command()?;
        cmd.arg("-S").arg(session_name).arg("-X").arg("quit");

        let output = self.run(cmd, "quit")?;
        if !output.status.success() {
            return Err(Error::SubprocessComm(format!(
                "screen failed to quit session {} ({}){}",
                session_name,
                output.status,
                stderr_excerpt(&output)
            )));
        }
        Ok(())
    }
}

/// One REPL instance and the log file it writes to.
pub struct Session {
    name: String,
    log_path: PathBuf,
    /// Deletes the log file when dropped.
    log: Option<TempPath>,
    multiplexer: Arc<dyn Multiplexer>,
}

impl Session {
    /// Create the log file and launch the REPL in `working_dir`.
    pub fn start(
        name: String,
        working_dir: &Path,
        config: &LeanGymConfig,
        multiplexer: Arc<dyn Multiplexer>,
    ) -> Result<Self> {
        if !working_dir.is_dir() {
            return Err(Error::Config(format!(
                "lean-gym directory not found: {}",
                working_dir.display()
            )));
        }

        let log = NamedTempFile::new()?.into_temp_path();
        let log_path = log.to_path_buf();

        multiplexer.launch(&LaunchSpec {
            session_name: &name,
            log_path: &log_path,
            working_dir,
            program: &config.repl_program,
            args: &config.repl_args,
        })?;

        tracing::info!(
            session = %name,
            log = %log_path.display(),
            cwd = %working_dir.display(),
            "Started lean-gym session"
        );

        Ok(Self {
            name,
            log_path,
            log: Some(log),
            multiplexer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Type one line into the REPL.
    pub fn send(&self, line: &str) -> Result<()> {
        self.multiplexer.send(&self.name, &format!("{line}\n"))
    }

    /// Ask the session to quit.
    pub fn terminate(&self) -> Result<()> {
        self.multiplexer.quit(&self.name)?;
        tracing::info!(session = %self.name, "Terminated lean-gym session");
        Ok(())
    }

    /// Delete the log file. Later calls are no-ops.
    pub fn remove_log(&mut self) -> Result<()> {
        if let Some(log) = self.log.take() {
            log.close()?;
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("log_path", &self.log_path)
            .finish_non_exhaustive()
    }
}
