//! Error types for renderforge-av.
//!
//! Every variant here is a fatal failure: the operation stops and the error
//! travels to the outermost caller. Recoverable misses (a tag that is not
//! present, a patch pass that produced nothing) are modelled as `Option`s and
//! outcome enums instead, so they never have to be caught as errors.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing or rendering.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A declared input file does not exist.
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// A declared input exists but is not a regular file.
    #[error("input is not a file: {}", path.display())]
    InputNotFile { path: PathBuf },

    /// A declared output already exists and would be overwritten.
    #[error("target output already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    /// The parent directory of a declared output does not exist.
    #[error("not a valid output directory: {}", path.display())]
    InvalidOutputDir { path: PathBuf },

    /// A timecode string could not be converted to seconds.
    #[error("invalid timecode {input:?}: expected [[HH:]MM:]SS[.ff]")]
    InvalidTimecode { input: String },

    /// A metadata query was malformed.
    #[error("invalid metadata query: {0}")]
    InvalidQuery(String),

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Scratch directory management failed.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Unsupported operation or format.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an input not found error.
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create an input not a file error.
    pub fn input_not_file(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFile { path: path.into() }
    }

    /// Create an output exists error.
    pub fn output_exists(path: impl Into<PathBuf>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create an invalid output directory error.
    pub fn invalid_output_dir(path: impl Into<PathBuf>) -> Self {
        Self::InvalidOutputDir { path: path.into() }
    }

    /// Create an invalid timecode error.
    pub fn invalid_timecode(input: impl Into<String>) -> Self {
        Self::InvalidTimecode {
            input: input.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a violated precondition on caller input
    /// (as opposed to an environment failure such as a missing binary).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::InputNotFound { .. }
                | Error::InputNotFile { .. }
                | Error::OutputExists { .. }
                | Error::InvalidOutputDir { .. }
                | Error::InvalidTimecode { .. }
                | Error::InvalidQuery(_)
        )
    }
}
