//! The render pipeline: run a transform, verify it, optionally patch it.
//!
//! Rendering is a two-step protocol. [`RenderPipeline::render`] checks the
//! job's files, runs its command and reports whether the declared outputs
//! appeared. [`RenderPipeline::patch`] then reattaches container metadata
//! (and optionally artwork) from the job's first input to each output, each
//! in its own [`ScratchDir`](crate::ScratchDir).
//! [`RenderPipeline::render_and_patch`] chains the two.

mod patch;

use crate::command::{Reporter, ToolCommand, TracingReporter};
use crate::commands::{with_tool_flags, ToolFlags, ToolFlavor};
use crate::probe::check_input;
use crate::tools::Toolset;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use patch::{PatchOutcome, PatchRequest};

static TRACING: TracingReporter = TracingReporter;

/// One transform invocation.
///
/// # Example
///
/// ```
/// use renderforge_av::RenderJob;
///
/// let job = RenderJob::new(["ffmpeg", "-i", "in.flac", "out.mp3"])
///     .input("in.flac")
///     .output("out.mp3");
/// assert_eq!(job.outputs.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderJob {
    /// Files the command reads. The first one is the metadata source for
    /// patch passes.
    pub inputs: Vec<PathBuf>,
    /// Files the command must produce.
    pub outputs: Vec<PathBuf>,
    /// Full argv, program first.
    pub command: Vec<OsString>,
    /// Decides which tool flags get added to the command.
    pub flavor: ToolFlavor,
}

impl RenderJob {
    /// Create a job running `command` (program first).
    pub fn new(command: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Declare an input file.
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Declare an output file.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Set the tool flavor.
    pub fn flavor(mut self, flavor: ToolFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Verify that every input is an existing regular file and that every
    /// output is new and lands in an existing directory.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition.
    pub fn check_preconditions(&self) -> Result<()> {
        for input in &self.inputs {
            check_input(input)?;
        }
        for output in &self.outputs {
            if output.exists() {
                return Err(Error::output_exists(output));
            }
            let parent = match output.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            if !parent.is_dir() {
                return Err(Error::invalid_output_dir(parent));
            }
        }
        Ok(())
    }
}

/// Presentation switches for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Report each output that was produced.
    pub print_success: bool,
    /// Report failed tool runs with their diagnostics.
    pub print_err: bool,
    /// Hand the tool's full diagnostic text to the reporter.
    pub print_info: bool,
    /// Report how long the render took.
    pub print_time: bool,
    /// Flags added to transcoder commands.
    pub flags: ToolFlags,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            print_success: true,
            print_err: true,
            print_info: false,
            print_time: true,
            flags: ToolFlags::default(),
        }
    }
}

impl RenderOptions {
    /// Options for the nested runs of a patch pass: only diagnostics
    /// follow the parent, and no faststart rewrite.
    pub(crate) fn nested(&self) -> Self {
        Self {
            print_success: false,
            print_err: false,
            print_info: self.print_info,
            print_time: false,
            flags: ToolFlags {
                hide_banner: true,
                faststart: false,
            },
        }
    }
}

/// Whether a render produced what it declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The tool succeeded and every declared output exists.
    Rendered,
    /// The tool failed or an output is missing.
    Failed,
}

/// Result of [`RenderPipeline::render`].
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Outcome.
    pub status: RenderStatus,
    /// Diagnostic text of the run.
    pub text: String,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl RenderReport {
    /// Whether the render succeeded.
    pub fn is_rendered(&self) -> bool {
        self.status == RenderStatus::Rendered
    }
}

/// Runs render jobs against a [`Toolset`].
///
/// # Example
///
/// ```no_run
/// use renderforge_av::{PatchRequest, RenderJob, RenderPipeline, Toolset};
///
/// let tools = Toolset::default();
/// let job = RenderJob::new(["ffmpeg", "-i", "in.m4a", "-c:a", "libmp3lame", "out.mp3"])
///     .input("in.m4a")
///     .output("out.mp3");
/// let outcome = RenderPipeline::new(&tools)
///     .render_and_patch(&job, &PatchRequest::default().artwork(true))?;
/// println!("{outcome:?}");
/// # Ok::<(), renderforge_av::Error>(())
/// ```
pub struct RenderPipeline<'a> {
    tools: &'a Toolset,
    options: RenderOptions,
    reporter: &'a dyn Reporter,
}

impl<'a> RenderPipeline<'a> {
    /// Pipeline with default options reporting through `tracing`.
    pub fn new(tools: &'a Toolset) -> Self {
        Self {
            tools,
            options: RenderOptions::default(),
            reporter: &TRACING,
        }
    }

    /// Replace the presentation options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the reporter.
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Run the primary phase of `job`.
    ///
    /// A tool that exits unsuccessfully, or succeeds without producing every
    /// declared output, yields [`RenderStatus::Failed`].
    ///
    /// # Errors
    ///
    /// Violated preconditions (see [`RenderJob::check_preconditions`]) and
    /// spawn failures are fatal.
    pub fn render(&self, job: &RenderJob) -> Result<RenderReport> {
        job.check_preconditions()?;

        let argv = with_tool_flags(&job.command, job.flavor, self.options.flags);
        let cmd = ToolCommand::from_argv(&argv)?;
        let output = cmd.run()?;
        let text = output.text();

        let missing = job.outputs.iter().find(|out| !out.exists());
        if !output.ok() || missing.is_some() {
            if let Some(missing) = missing.filter(|_| output.ok()) {
                tracing::debug!(
                    "{} exited cleanly but {:?} is missing",
                    cmd.program_name(),
                    missing
                );
            }
            if self.options.print_err {
                self.reporter.failed(&cmd.display_argv(), &text);
            }
            return Ok(RenderReport {
                status: RenderStatus::Failed,
                text,
                elapsed: output.elapsed,
            });
        }

        if self.options.print_info {
            self.reporter.diagnostics(&text);
        }
        if self.options.print_success {
            for out in &job.outputs {
                self.reporter.rendered(out);
            }
        }
        if self.options.print_time {
            let subject = job
                .outputs
                .first()
                .map(PathBuf::as_path)
                .unwrap_or_else(|| cmd.program());
            self.reporter.elapsed(subject, output.elapsed, false);
        }

        Ok(RenderReport {
            status: RenderStatus::Rendered,
            text,
            elapsed: output.elapsed,
        })
    }

    /// Render `job`, then patch its outputs as `request` asks.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`render`](Self::render) and
    /// [`patch`](Self::patch), a failed primary render is fatal here
    /// ([`Error::ToolFailed`]): there is nothing to patch. A job without a
    /// usable first input is rejected before the tool runs.
    pub fn render_and_patch(
        &self,
        job: &RenderJob,
        request: &PatchRequest,
    ) -> Result<PatchOutcome> {
        patch::patch_source(job)?;
        let report = self.render(job)?;
        if !report.is_rendered() {
            let tool = job
                .command
                .first()
                .map(|p| Path::new(p).display().to_string())
                .unwrap_or_default();
            return Err(Error::tool_failed(tool, report.text.trim_end()));
        }
        self.patch(job, request)
    }

    /// Pipeline for the nested runs of a patch pass.
    pub(crate) fn nested(&self) -> RenderPipeline<'a> {
        RenderPipeline {
            tools: self.tools,
            options: self.options.nested(),
            reporter: self.reporter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SilentReporter;
    use std::fs;

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob::new(["true"])
            .input(dir.path().join("missing.mp3"))
            .output(dir.path().join("out.mp3"));
        let err = job.check_preconditions().unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }

    #[test]
    fn test_existing_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp3");
        let output = dir.path().join("out.mp3");
        fs::write(&input, b"in").unwrap();
        fs::write(&output, b"out").unwrap();

        let job = RenderJob::new(["true"]).input(&input).output(&output);
        assert!(matches!(
            job.check_preconditions(),
            Err(Error::OutputExists { .. })
        ));
    }

    #[test]
    fn test_output_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob::new(["true"]).output(dir.path().join("nope/out.mp3"));
        assert!(matches!(
            job.check_preconditions(),
            Err(Error::InvalidOutputDir { .. })
        ));
    }

    #[test]
    fn test_bare_output_name_uses_current_dir() {
        let job = RenderJob::new(["true"]).output("renderforge-test-never-created.mp3");
        assert!(job.check_preconditions().is_ok());
    }

    #[test]
    fn test_nested_options() {
        let options = RenderOptions {
            print_info: true,
            ..RenderOptions::default()
        };
        let nested = options.nested();
        assert!(nested.print_info);
        assert!(!nested.print_success);
        assert!(!nested.print_err);
        assert!(!nested.print_time);
        assert!(!nested.flags.faststart);
    }

    #[cfg(unix)]
    #[test]
    fn test_render_reports_missing_output_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let tools = Toolset::default();
        let job = RenderJob::new(["true"])
            .output(dir.path().join("out.mp3"))
            .flavor(ToolFlavor::Generic);

        let report = RenderPipeline::new(&tools)
            .with_reporter(&SilentReporter)
            .render(&job)
            .unwrap();
        assert_eq!(report.status, RenderStatus::Failed);
    }

    #[cfg(unix)]
    #[test]
    fn test_render_and_patch_fails_on_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tools = Toolset::default();
        let job = RenderJob::new(["false"])
            .output(dir.path().join("out.mp3"))
            .flavor(ToolFlavor::Generic);

        let err = RenderPipeline::new(&tools)
            .with_reporter(&SilentReporter)
            .render_and_patch(&job, &PatchRequest::default())
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_render_and_patch_without_input_never_runs_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let script = format!("echo data > '{}'", output.display());
        let tools = Toolset::default();
        let job = RenderJob::new(["sh", "-c", script.as_str()])
            .output(&output)
            .flavor(ToolFlavor::Generic);

        let err = RenderPipeline::new(&tools)
            .with_reporter(&SilentReporter)
            .render_and_patch(&job, &PatchRequest::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_render_and_patch_with_missing_source_never_runs_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let script = format!("echo data > '{}'", output.display());
        let tools = Toolset::default();
        let job = RenderJob::new(["sh", "-c", script.as_str()])
            .input(dir.path().join("missing.flac"))
            .output(&output)
            .flavor(ToolFlavor::Generic);

        let err = RenderPipeline::new(&tools)
            .with_reporter(&SilentReporter)
            .render_and_patch(&job, &PatchRequest::default())
            .unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
        assert!(!output.exists());
    }
}
