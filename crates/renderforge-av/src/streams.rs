//! Classification of a stream listing into typed descriptors.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;

/// Marker ffmpeg appends to video streams that are embedded still images.
const ATTACHED_PIC: &str = "(attached pic)";

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Playable video footage.
    Video,
    /// Audio track.
    Audio,
    /// Video stream flagged as an attached picture (cover art).
    Artwork,
    /// Data stream (chapter text tracks in mp4-family containers).
    Chapter,
    /// Subtitle track.
    Subtitle,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Video => write!(f, "Video"),
            StreamKind::Audio => write!(f, "Audio"),
            StreamKind::Artwork => write!(f, "Artwork"),
            StreamKind::Chapter => write!(f, "Chapter"),
            StreamKind::Subtitle => write!(f, "Subtitle"),
        }
    }
}

/// One classified stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Position among classified streams, matching the tool's stream index.
    pub index: usize,
    /// Stream kind.
    pub kind: StreamKind,
    /// Three-letter language code, only for subtitles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Kind markers in the order they are tried at each position of a line.
const MARKERS: [(&str, StreamKind); 4] = [
    ("Video", StreamKind::Video),
    ("Audio", StreamKind::Audio),
    ("Data", StreamKind::Chapter),
    ("Subtitle", StreamKind::Subtitle),
];

fn classify_line(line: &str) -> Option<(StreamKind, Option<String>)> {
    let (_, kind) = MARKERS
        .iter()
        .filter_map(|(marker, kind)| line.find(marker).map(|pos| (pos, *kind)))
        .min_by_key(|(pos, _)| *pos)?;

    match kind {
        StreamKind::Video if line.trim_end().ends_with(ATTACHED_PIC) => {
            Some((StreamKind::Artwork, None))
        }
        StreamKind::Subtitle => Some((kind, subtitle_language(line))),
        _ => Some((kind, None)),
    }
}

/// Three characters after the first `(` on the line (`0:2(eng): Subtitle`).
fn subtitle_language(line: &str) -> Option<String> {
    let open = line.find('(')?;
    let code: String = line[open + 1..].chars().take(3).collect();
    (code.chars().count() == 3).then_some(code)
}

/// Classify a stream listing (one stream per line, in probe order).
///
/// Lines carrying no kind marker are skipped. The `n`th classified line gets
/// index `n`, which is what stream selectors like `-map 0:n` expect.
///
/// # Example
///
/// ```
/// use renderforge_av::streams::{classify, StreamKind};
///
/// let listing = "0:0(und): Audio: mp3, 44100 Hz\n0:1: Video: mjpeg, 600x600 (attached pic)";
/// let kinds: Vec<_> = classify(listing).into_iter().map(|s| s.kind).collect();
/// assert_eq!(kinds, [StreamKind::Audio, StreamKind::Artwork]);
/// ```
pub fn classify(listing: &str) -> Vec<StreamDescriptor> {
    listing
        .lines()
        .filter_map(classify_line)
        .enumerate()
        .map(|(index, (kind, language))| StreamDescriptor {
            index,
            kind,
            language,
        })
        .collect()
}

/// Whether any stream is of `kind`.
pub fn has_kind(streams: &[StreamDescriptor], kind: StreamKind) -> bool {
    streams.iter().any(|s| s.kind == kind)
}

/// Negative video selector that drops the artwork stream, if there is one.
///
/// With real footage present the artwork is the second video stream
/// (`-0:v:1`); in an audio file it is the only one (`-0:v:0`).
pub fn artwork_removal_selector(streams: &[StreamDescriptor]) -> Option<String> {
    if !has_kind(streams, StreamKind::Artwork) {
        return None;
    }
    let video_index = if has_kind(streams, StreamKind::Video) { 1 } else { 0 };
    Some(format!("-0:v:{video_index}"))
}

/// `-map 0:<i>` arguments for every stream of `kind`.
pub fn map_streams_of_kind(streams: &[StreamDescriptor], kind: StreamKind) -> Vec<OsString> {
    streams
        .iter()
        .filter(|s| s.kind == kind)
        .flat_map(|s| [OsString::from("-map"), OsString::from(format!("0:{}", s.index))])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(listing: &str) -> Vec<StreamKind> {
        classify(listing).into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn video_then_audio() {
        let listing = "0:0(eng): Video: h264 (High), yuv420p, 1920x1080\n0:1(eng): Audio: aac (LC), 48000 Hz";
        let streams = classify(listing);
        assert_eq!(kinds(listing), [StreamKind::Video, StreamKind::Audio]);
        assert_eq!(streams[0].index, 0);
        assert_eq!(streams[1].index, 1);
    }

    #[test]
    fn attached_picture_is_artwork() {
        let listing = "0:0: Video: h264, 1280x720\n0:1: Video: png, 500x500 (attached pic)";
        assert_eq!(kinds(listing), [StreamKind::Video, StreamKind::Artwork]);
    }

    #[test]
    fn attached_picture_with_trailing_space() {
        assert_eq!(kinds("0:1: Video: mjpeg (attached pic)  "), [StreamKind::Artwork]);
    }

    #[test]
    fn subtitle_language() {
        let streams = classify("0:2(jpn): Subtitle: mov_text (tx3g / 0x67337874)");
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].kind, StreamKind::Subtitle);
        assert_eq!(streams[0].language.as_deref(), Some("jpn"));
    }

    #[test]
    fn data_is_chapter_and_unknown_lines_skipped() {
        let listing = "0:0(und): Audio: aac\nsome framing line\n0:1(eng): Data: bin_data (text / 0x74786574)";
        let streams = classify(listing);
        assert_eq!(kinds(listing), [StreamKind::Audio, StreamKind::Chapter]);
        assert_eq!(streams[1].index, 1);
        assert!(streams[1].language.is_none());
    }

    #[test]
    fn earliest_marker_wins() {
        assert_eq!(kinds("0:0: Audio: pcm (Video Mix)"), [StreamKind::Audio]);
    }

    #[test]
    fn artwork_selector() {
        let with_video = classify("0:0: Video: h264\n0:1: Audio: aac\n0:2: Video: png (attached pic)");
        assert_eq!(artwork_removal_selector(&with_video).as_deref(), Some("-0:v:1"));

        let audio_only = classify("0:0: Audio: mp3\n0:1: Video: mjpeg (attached pic)");
        assert_eq!(artwork_removal_selector(&audio_only).as_deref(), Some("-0:v:0"));

        let no_art = classify("0:0: Audio: mp3");
        assert_eq!(artwork_removal_selector(&no_art), None);
    }

    #[test]
    fn map_audio_streams() {
        let streams = classify("0:0: Video: h264\n0:1: Audio: aac\n0:2: Audio: ac3");
        let args = map_streams_of_kind(&streams, StreamKind::Audio);
        assert_eq!(args, ["-map", "0:1", "-map", "0:2"].map(OsString::from));
    }
}
