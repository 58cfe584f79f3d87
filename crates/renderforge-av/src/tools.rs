//! External tool detection and the set of binaries the pipeline drives.

use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default program name of the transcoder.
pub const FFMPEG: &str = "ffmpeg";
/// Default program name of the prober.
pub const FFPROBE: &str = "ffprobe";
/// Default program name of the tagging tool.
pub const ATOMIC_PARSLEY: &str = "AtomicParsley";

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use renderforge_av::check_tool;
///
/// let info = check_tool("ffprobe", "-version");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(name).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check every tool the pipeline can drive.
///
/// Returns information about ffmpeg, ffprobe, and AtomicParsley.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![
        check_tool(FFMPEG, "-version"),
        check_tool(FFPROBE, "-version"),
        check_tool(ATOMIC_PARSLEY, "--version"),
    ]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Paths of the three external programs.
///
/// The default set uses bare program names and lets the OS resolve them at
/// spawn time; [`Toolset::resolve`] checks them up front instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolset {
    /// Transcoder (ffmpeg).
    pub transcoder: PathBuf,
    /// Prober (ffprobe).
    pub prober: PathBuf,
    /// Tagging tool (AtomicParsley).
    pub tagger: PathBuf,
}

impl Default for Toolset {
    fn default() -> Self {
        Self {
            transcoder: PathBuf::from(FFMPEG),
            prober: PathBuf::from(FFPROBE),
            tagger: PathBuf::from(ATOMIC_PARSLEY),
        }
    }
}

impl Toolset {
    /// Resolve transcoder and prober (required) and the tagger (optional,
    /// falls back to its bare name) from configured overrides or PATH.
    pub fn resolve(
        transcoder: Option<&Path>,
        prober: Option<&Path>,
        tagger: Option<&Path>,
    ) -> Result<Self> {
        let tagger = get_tool_path(ATOMIC_PARSLEY, tagger)
            .unwrap_or_else(|_| PathBuf::from(ATOMIC_PARSLEY));

        Ok(Self {
            transcoder: get_tool_path(FFMPEG, transcoder)?,
            prober: get_tool_path(FFPROBE, prober)?,
            tagger,
        })
    }
}
