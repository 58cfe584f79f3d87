//! Running external tools and capturing their diagnostic text.

use crate::timecode::describe_elapsed;
use crate::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Wall-clock time spent waiting for the process.
    pub elapsed: Duration,
}

impl ToolOutput {
    /// Whether the process exited with status zero.
    pub fn ok(&self) -> bool {
        self.status.success()
    }

    /// Combined diagnostic text: stderr followed by stdout.
    ///
    /// ffmpeg-family tools print their informational output on stderr and
    /// only use stdout for piped artifacts or `-show_entries` values.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.stderr.len() + self.stdout.len());
        text.push_str(&self.stderr);
        text.push_str(&self.stdout);
        text
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// Execution is blocking: the process runs to completion before `run`
/// returns. There is no timeout.
///
/// # Example
///
/// ```no_run
/// use renderforge_av::ToolCommand;
///
/// let output = ToolCommand::new("ffprobe")
///     .arg("-i")
///     .arg("/path/to/song.mp3")
///     .arg("-hide_banner")
///     .run()?;
/// println!("{}", output.text());
/// # Ok::<(), renderforge_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build a command from a full argv whose first element is the program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when the argv is empty.
    pub fn from_argv(argv: &[OsString]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Unsupported("empty command".to_string()))?;
        let mut cmd = Self::new(program);
        cmd.args(args);
        Ok(cmd)
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl AsRef<OsStr>>) -> &mut Self {
        self.args
            .extend(iter.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The program that will be spawned.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Short program name for error messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Full argv, program first, for display.
    pub fn display_argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().map(|a| a.to_string_lossy().to_string()))
            .collect()
    }

    /// Spawn the process, wait for it, and capture both output streams.
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// [`ToolOutput::ok`] and decide. Only a failure to spawn is.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program does not exist.
    /// - [`Error::Io`] for any other spawn or wait failure.
    pub fn run(&self) -> Result<ToolOutput> {
        tracing::debug!(argv = ?self.display_argv(), "Running tool");

        let start = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(self.program_name())
                } else {
                    Error::Io(e)
                }
            })?;
        let elapsed = start.elapsed();

        tracing::trace!(
            "{} exited with {} after {:?}",
            self.program_name(),
            output.status,
            elapsed
        );

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed,
        })
    }
}

/// Presentation policy for tool runs.
///
/// The pipeline and prober never print on their own; they hand everything a
/// user might want to see to a `Reporter`. Every method defaults to doing
/// nothing.
pub trait Reporter {
    /// Raw diagnostic text of a finished run.
    fn diagnostics(&self, _text: &str) {}

    /// How long a render (`scan == false`) or a scan took.
    fn elapsed(&self, _subject: &Path, _elapsed: Duration, _scan: bool) {}

    /// A declared output was produced.
    fn rendered(&self, _output: &Path) {}

    /// A tool exited unsuccessfully.
    fn failed(&self, _argv: &[String], _text: &str) {}

    /// A patch pass left `output` unpatched.
    fn patch_missed(&self, _output: &Path, _reason: &str) {}
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn diagnostics(&self, text: &str) {
        tracing::info!("{}", text.trim_end());
    }

    fn elapsed(&self, subject: &Path, elapsed: Duration, scan: bool) {
        tracing::info!("{:?}: {}", subject, describe_elapsed(elapsed, scan));
    }

    fn rendered(&self, output: &Path) {
        tracing::info!("{:?} was rendered successfully", output);
    }

    fn failed(&self, argv: &[String], text: &str) {
        tracing::error!(?argv, "A problem occurred while rendering:\n{}", text.trim_end());
    }

    fn patch_missed(&self, output: &Path, reason: &str) {
        tracing::warn!("Left {:?} unpatched: {}", output, reason);
    }
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_echo() {
        let output = ToolCommand::new("echo").arg("hello").run();

        match output {
            Ok(out) => {
                assert!(out.ok());
                assert!(out.stdout.trim().contains("hello"));
                assert!(out.text().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[test]
    fn run_nonexistent_tool() {
        let result = ToolCommand::new("nonexistent_tool_xyz_12345").run();
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_not_an_error() {
        let out = ToolCommand::new("sh")
            .args(["-c", "echo diag >&2; echo data; exit 3"])
            .run()
            .unwrap();
        assert!(!out.ok());
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.text(), "diag\ndata\n");
    }

    #[test]
    fn from_argv_splits_program() {
        let argv: Vec<OsString> = ["ffmpeg", "-i", "in.mp4"].iter().map(OsString::from).collect();
        let cmd = ToolCommand::from_argv(&argv).unwrap();
        assert_eq!(cmd.program(), Path::new("ffmpeg"));
        assert_eq!(cmd.display_argv(), vec!["ffmpeg", "-i", "in.mp4"]);
        assert!(ToolCommand::from_argv(&[]).is_err());
    }
}
