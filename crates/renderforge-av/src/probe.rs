//! Metadata acquisition: run the right probe for each field and parse it.

use crate::command::{Reporter, SilentReporter, ToolCommand, ToolOutput};
use crate::commands;
use crate::parse::extract;
use crate::query::{MetadataField, MetadataQuery, MetadataValue};
use crate::streams::{classify, StreamDescriptor};
use crate::timecode::to_seconds;
use crate::tools::Toolset;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

static SILENT: SilentReporter = SilentReporter;

/// Probes one input file.
///
/// Construction checks that the input is an existing regular file; every
/// accessor after that runs one or more external probes.
///
/// # Example
///
/// ```no_run
/// use renderforge_av::{MetadataField, MetadataQuery, Prober, Toolset};
///
/// let tools = Toolset::default();
/// let prober = Prober::new(&tools, "/music/song.m4a")?;
/// let values = prober.query(&MetadataQuery::in_order([
///     MetadataField::Title,
///     MetadataField::Duration,
/// ]))?;
/// println!("{} ({})", values[0], values[1]);
/// # Ok::<(), renderforge_av::Error>(())
/// ```
pub struct Prober<'a> {
    tools: &'a Toolset,
    input: PathBuf,
    reporter: &'a dyn Reporter,
    print_info: bool,
    print_time: bool,
}

impl<'a> Prober<'a> {
    /// Create a prober for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] or [`Error::InputNotFile`] if the
    /// input is missing or not a regular file.
    pub fn new(tools: &'a Toolset, input: impl AsRef<Path>) -> Result<Self> {
        let input = input.as_ref();
        check_input(input)?;
        Ok(Self {
            tools,
            input: input.to_path_buf(),
            reporter: &SILENT,
            print_info: false,
            print_time: false,
        })
    }

    /// Route diagnostics and scan times to `reporter`.
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Hand the raw text of every probe to the reporter.
    pub fn print_info(mut self, enabled: bool) -> Self {
        self.print_info = enabled;
        self
    }

    /// Report how long each probe took.
    pub fn print_time(mut self, enabled: bool) -> Self {
        self.print_time = enabled;
        self
    }

    /// The file being probed.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Fetch every field of `query`, in output order.
    ///
    /// The query is validated before any tool runs. Fields the file does not
    /// carry come back as [`MetadataValue::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] for a malformed query, and tool spawn
    /// or timecode errors as they occur.
    pub fn query(&self, query: &MetadataQuery) -> Result<Vec<MetadataValue>> {
        let fields = query.ordered()?;
        check_input(&self.input)?;

        let mut banner: Option<String> = None;
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value = self.fetch(field, &mut banner)?;
            tracing::debug!(%field, %value, "Fetched metadata value");
            values.push(value);
        }
        Ok(values)
    }

    /// Fetch a single field.
    pub fn field(&self, field: MetadataField) -> Result<MetadataValue> {
        Ok(self
            .query(&MetadataQuery::in_order([field]))?
            .into_iter()
            .next()
            .unwrap_or(MetadataValue::NotFound))
    }

    /// Classified stream inventory, in probe order.
    pub fn stream_descriptors(&self) -> Result<Vec<StreamDescriptor>> {
        let listing = self.field(MetadataField::Streams)?;
        Ok(listing.as_text().map(classify).unwrap_or_default())
    }

    /// Decoded duration in seconds, or `None` if the tool cannot tell.
    pub fn duration_seconds(&self) -> Result<Option<f64>> {
        Ok(self.field(MetadataField::Duration)?.as_seconds())
    }

    /// Crop geometry `W:H:X:Y` reported by `cropdetect`.
    pub fn crop_box(&self) -> Result<Option<String>> {
        Ok(self
            .field(MetadataField::CropDetect)?
            .as_text()
            .map(str::to_string))
    }

    /// Write the container metadata to `<stem>-METADATA.txt` beside the
    /// input, replacing an earlier export. Returns the export path, or `None`
    /// if the tool produced nothing.
    pub fn export_metadata_file(&self) -> Result<Option<PathBuf>> {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let export = self.input.with_file_name(format!("{stem}-METADATA.txt"));
        if export.exists() {
            std::fs::remove_file(&export)?;
        }

        let argv = commands::export_metadata(self.tools, &self.input, &export);
        let output = self.run(&argv)?;
        if !output.ok() {
            tracing::warn!("Metadata export of {:?} failed", self.input);
        }
        Ok(export.is_file().then_some(export))
    }

    fn fetch(&self, field: MetadataField, banner: &mut Option<String>) -> Result<MetadataValue> {
        let keyword = field.keyword();
        let value = match field {
            MetadataField::MaxVolume => {
                let text = self.scan(&commands::filter_scan(
                    self.tools,
                    &self.input,
                    "-af",
                    "volumedetect",
                ))?;
                MetadataValue::from_text(extract(&text, keyword))
            }
            MetadataField::CropDetect => {
                let text = self.scan(&commands::filter_scan(
                    self.tools,
                    &self.input,
                    "-vf",
                    "cropdetect",
                ))?;
                MetadataValue::from_text(extract(&text, keyword))
            }
            MetadataField::Streams
            | MetadataField::FirstAudioStream
            | MetadataField::FirstVideoStream
            | MetadataField::StartOffset => {
                if banner.is_none() {
                    *banner = Some(self.scan(&commands::probe_banner(self.tools, &self.input))?);
                }
                let text = banner.as_deref().unwrap_or_default();
                MetadataValue::from_text(extract(text, keyword))
            }
            MetadataField::Duration => {
                let text = self.scan(&commands::duration_scan(self.tools, &self.input))?;
                match extract(&text, keyword) {
                    Some(timecode) if timecode != "N/A" => {
                        MetadataValue::Seconds(to_seconds(&timecode)?)
                    }
                    _ => MetadataValue::NotFound,
                }
            }
            MetadataField::Dimensions => {
                let output = self.run(&commands::video_dimensions(self.tools, &self.input))?;
                let dims = output.stdout.trim();
                MetadataValue::from_text((!dims.is_empty()).then(|| dims.to_string()))
            }
            _ => {
                let output = self.run(&commands::format_tag(self.tools, &self.input, keyword))?;
                tag_value(&output.stdout)
            }
        };

        if !value.is_found() {
            tracing::debug!("Metadata value {:?} not found in {:?}", keyword, self.input);
        }
        Ok(value)
    }

    /// Run a probe and return its combined text.
    fn scan(&self, argv: &[OsString]) -> Result<String> {
        Ok(self.run(argv)?.text())
    }

    fn run(&self, argv: &[OsString]) -> Result<ToolOutput> {
        let output = ToolCommand::from_argv(argv)?.run()?;
        if self.print_info {
            self.reporter.diagnostics(&output.text());
        }
        if self.print_time {
            self.reporter.elapsed(&self.input, output.elapsed, true);
        }
        Ok(output)
    }
}

/// Value printed by a `-show_entries format_tags=<tag>` probe.
fn tag_value(stdout: &str) -> MetadataValue {
    let value = stdout
        .strip_suffix("\r\n")
        .or_else(|| stdout.strip_suffix('\n'))
        .unwrap_or(stdout);
    if value.trim().is_empty() {
        return MetadataValue::NotFound;
    }
    MetadataValue::Text(value.to_string())
}

/// Fail unless `path` is an existing regular file.
pub(crate) fn check_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::input_not_found(path));
    }
    if !path.is_file() {
        return Err(Error::input_not_file(path));
    }
    Ok(())
}
