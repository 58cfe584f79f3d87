//! The metadata patch pass.

use super::{RenderJob, RenderPipeline};
use crate::commands::{self, ArtworkEmbed, ToolFlavor};
use crate::probe::{check_input, Prober};
use crate::streams::{has_kind, StreamKind};
use crate::workspace::ScratchDir;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// What a patch pass should reattach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchRequest {
    /// Also reattach the source's artwork when the output lost it.
    pub artwork: bool,
    /// Keep the output's chapters instead of dropping them.
    pub copy_chapters: bool,
}

impl PatchRequest {
    /// Request artwork reattachment.
    pub fn artwork(mut self, enabled: bool) -> Self {
        self.artwork = enabled;
        self
    }

    /// Request chapter preservation.
    pub fn copy_chapters(mut self, enabled: bool) -> Self {
        self.copy_chapters = enabled;
        self
    }
}

/// Result of a patch pass over all outputs of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Every output was patched.
    Patched,
    /// These outputs were left (fully or partly) unpatched. They are still
    /// the valid results of the primary render.
    Unpatched(Vec<PathBuf>),
}

impl PatchOutcome {
    /// Whether every output was patched.
    pub fn is_patched(&self) -> bool {
        matches!(self, PatchOutcome::Patched)
    }
}

impl RenderPipeline<'_> {
    /// Reattach the metadata of the job's first input to each of its outputs.
    ///
    /// Every output gets its own scratch directory beside it. The metadata is
    /// copied into a patched copy there, which then replaces the output. With
    /// [`PatchRequest::artwork`], artwork the source carries and the output
    /// lacks is extracted and embedded in a second round. The scratch
    /// directory is removed before moving on, whatever happened.
    ///
    /// A patched copy that never materializes is not an error: the output is
    /// left as rendered and reported in [`PatchOutcome::Unpatched`].
    ///
    /// # Errors
    ///
    /// Fails if the job has no input, an input or output is missing, or a
    /// tool cannot be spawned.
    pub fn patch(&self, job: &RenderJob, request: &PatchRequest) -> Result<PatchOutcome> {
        let source = patch_source(job)?;

        let mut unpatched = Vec::new();
        for output in &job.outputs {
            check_input(output)?;

            let scratch = ScratchDir::beside(output)?;
            let patched = self.patch_output(&scratch, source, request)?;
            if let Err(e) = scratch.close() {
                tracing::warn!("{}", e);
            }

            if !patched {
                unpatched.push(output.clone());
            }
        }

        if unpatched.is_empty() {
            Ok(PatchOutcome::Patched)
        } else {
            Ok(PatchOutcome::Unpatched(unpatched))
        }
    }

    fn patch_output(
        &self,
        scratch: &ScratchDir,
        source: &Path,
        request: &PatchRequest,
    ) -> Result<bool> {
        let target = scratch.target();
        let copy = scratch.patched_copy();
        tracing::debug!("Copying metadata of {:?} into {:?}", source, target);

        let job = RenderJob::new(commands::copy_metadata(
            self.tools,
            target,
            source,
            &copy,
            request.copy_chapters,
        ))
        .input(target)
        .input(source)
        .output(&copy);

        if !self.nested().render(&job)?.is_rendered() {
            self.missed(target, "the metadata copy was not produced");
            return Ok(false);
        }
        scratch.swap_into_place(&copy)?;

        if request.artwork {
            return self.patch_artwork(scratch, source);
        }
        Ok(true)
    }

    fn patch_artwork(&self, scratch: &ScratchDir, source: &Path) -> Result<bool> {
        let target = scratch.target();

        let source_streams = self.prober(source)?.stream_descriptors()?;
        if !has_kind(&source_streams, StreamKind::Artwork) {
            tracing::debug!("{:?} has no artwork to reattach", source);
            return Ok(true);
        }
        let output_streams = self.prober(target)?.stream_descriptors()?;
        if has_kind(&output_streams, StreamKind::Artwork) {
            return Ok(true);
        }

        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "artwork".to_string());
        let art = scratch.temp_file(&format!("{stem}.jpg"));
        let nested = self.nested();

        let extract = RenderJob::new(commands::extract_artwork(self.tools, source, &art))
            .input(source)
            .output(&art);
        if !nested.render(&extract)?.is_rendered() {
            self.missed(target, "the artwork could not be extracted");
            return Ok(false);
        }

        let copy = scratch.patched_copy();
        let embed = match commands::embed_artwork(self.tools, target, &art, &copy) {
            Some(ArtworkEmbed::Transcode(argv)) => RenderJob::new(argv)
                .input(target)
                .input(&art)
                .output(&copy),
            Some(ArtworkEmbed::InPlace(argv)) => {
                std::fs::copy(target, &copy)?;
                RenderJob::new(argv)
                    .input(&copy)
                    .input(&art)
                    .flavor(ToolFlavor::Tagger)
            }
            None => {
                self.missed(target, "artwork cannot be embedded in this container");
                return Ok(false);
            }
        };

        if !nested.render(&embed)?.is_rendered() || !copy.is_file() {
            self.missed(target, "the artwork was not embedded");
            return Ok(false);
        }
        scratch.swap_into_place(&copy)?;
        Ok(true)
    }

    fn prober<'p>(&'p self, input: &Path) -> Result<Prober<'p>> {
        Ok(Prober::new(self.tools, input)?
            .with_reporter(self.reporter)
            .print_info(self.options.print_info))
    }

    fn missed(&self, output: &Path, reason: &str) {
        tracing::debug!("Patch of {:?} missed: {}", output, reason);
        if self.options.print_err {
            self.reporter.patch_missed(output, reason);
        }
    }
}

/// The input a patch pass copies metadata from.
pub(super) fn patch_source(job: &RenderJob) -> Result<&Path> {
    let source = job.inputs.first().ok_or_else(|| {
        Error::Unsupported("a patch pass needs an input to copy metadata from".to_string())
    })?;
    check_input(source)?;
    Ok(source.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SilentReporter;
    use crate::tools::Toolset;

    #[test]
    fn test_request_builder() {
        let request = PatchRequest::default().artwork(true);
        assert!(request.artwork);
        assert!(!request.copy_chapters);
        assert!(request.copy_chapters(true).copy_chapters);
    }

    #[test]
    fn test_patch_needs_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        std::fs::write(&output, b"out").unwrap();

        let tools = Toolset::default();
        let job = RenderJob::new(["true"]).output(&output);
        let err = RenderPipeline::new(&tools)
            .with_reporter(&SilentReporter)
            .patch(&job, &PatchRequest::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_outcome() {
        assert!(PatchOutcome::Patched.is_patched());
        assert!(!PatchOutcome::Unpatched(vec![PathBuf::from("a.mp3")]).is_patched());
    }
}
