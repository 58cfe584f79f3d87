//! Extraction of values from human-formatted tool diagnostics.
//!
//! ffmpeg and ffprobe print column-aligned text meant for people, e.g.
//!
//! ```text
//!   Metadata:
//!     title           : Song Name
//!     description     : First line
//!                     : Second line
//!   Duration: 00:03:12.41, start: 0.000000, bitrate: 256 kb/s
//!     Stream #0:0(und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo
//! ```
//!
//! [`extract`] locates the first occurrence of a keyword and hands the text
//! from there on to an [`ExtractionPolicy`]. Which policy applies is decided
//! by a [`Dialect`]; [`FfmpegDialect`] knows the three shapes ffmpeg uses
//! (stream listings, crop boxes, and `key : value` tags).

mod policies;

pub use policies::{CropBox, StreamListing, TagValue};

/// Strategy for pulling one value out of the text that follows a keyword.
pub trait ExtractionPolicy {
    /// Extract a value. `tail` starts at the keyword's first occurrence
    /// (keyword included) and runs to the end of the text.
    ///
    /// Returns `None` when nothing usable follows the keyword.
    fn extract(&self, keyword: &str, tail: &str) -> Option<String>;
}

/// Maps keywords to the policy that understands their formatting.
pub trait Dialect {
    /// Policy used for `keyword`.
    fn policy_for(&self, keyword: &str) -> &dyn ExtractionPolicy;
}

/// The diagnostic dialect printed by ffmpeg and ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegDialect;

impl Dialect for FfmpegDialect {
    fn policy_for(&self, keyword: &str) -> &dyn ExtractionPolicy {
        match keyword {
            "Stream" => &StreamListing,
            "crop" => &CropBox,
            _ => &TagValue,
        }
    }
}

/// Extract the value of `keyword` from ffmpeg-family diagnostic text.
///
/// Returns `None` when the keyword does not occur or its value is empty.
///
/// # Example
///
/// ```
/// use renderforge_av::parse::extract;
///
/// let text = "  Duration: 00:01:30.25, start: 0.000000, bitrate: 128 kb/s\n";
/// assert_eq!(extract(text, "Duration").as_deref(), Some("01:30.25"));
/// assert_eq!(extract(text, "artist"), None);
/// ```
pub fn extract(text: &str, keyword: &str) -> Option<String> {
    extract_with(&FfmpegDialect, text, keyword)
}

/// Extract the value of `keyword` using a specific dialect.
pub fn extract_with(dialect: &dyn Dialect, text: &str, keyword: &str) -> Option<String> {
    if keyword.is_empty() {
        return None;
    }
    let start = text.find(keyword)?;
    dialect
        .policy_for(keyword)
        .extract(keyword, &text[start..])
        .filter(|value| !value.is_empty())
}

/// Line cursor shared by the policies.
///
/// Lives for one extraction: walks the lines after the keyword, accumulating
/// pieces of the value until a policy decides the value has ended.
pub(crate) struct Scanner<'a> {
    lines: Vec<&'a str>,
    line: usize,
    pieces: Vec<String>,
    terminated: bool,
}

impl<'a> Scanner<'a> {
    /// Scanner over `rest`, the text after the keyword. The first line is
    /// whatever remains of the keyword's own line.
    pub(crate) fn new(rest: &'a str) -> Self {
        Self {
            lines: rest.lines().collect(),
            line: 0,
            pieces: Vec::new(),
            terminated: false,
        }
    }

    /// Next line, or `None` once the text is exhausted or the value ended.
    pub(crate) fn next_line(&mut self) -> Option<&'a str> {
        if self.terminated {
            return None;
        }
        let line = self.lines.get(self.line).copied();
        self.line += 1;
        line
    }

    pub(crate) fn push(&mut self, piece: &str) {
        self.pieces.push(piece.to_string());
    }

    pub(crate) fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Accumulated pieces joined by newlines.
    pub(crate) fn finish(self) -> String {
        self.pieces.join("\n")
    }
}

/// Index and value of the first non-padding character of `line`.
pub(crate) fn first_content(line: &str) -> Option<(usize, char)> {
    line.char_indices().find(|(_, c)| *c != ' ' && *c != '\t')
}
