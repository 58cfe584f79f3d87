//! Argument lists for the invocations the core issues itself.
//!
//! Every builder returns a full argv (program first). Flag vocabulary for
//! ffmpeg, ffprobe and AtomicParsley lives here and nowhere else.

use crate::tools::Toolset;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Which family a command belongs to, deciding what gets appended to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolFlavor {
    /// ffmpeg: accepts `-hide_banner` and `-movflags +faststart`.
    #[default]
    Transcoder,
    /// AtomicParsley: edits in place, takes no ffmpeg flags.
    Tagger,
    /// Anything else: run exactly as given.
    Generic,
}

/// Extra flags for transcoder commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolFlags {
    /// Insert `-hide_banner` after the program.
    pub hide_banner: bool,
    /// Insert `-movflags +faststart` before the output argument.
    pub faststart: bool,
}

impl Default for ToolFlags {
    fn default() -> Self {
        Self {
            hide_banner: true,
            faststart: true,
        }
    }
}

/// Apply `flags` to `argv` according to `flavor`.
///
/// The output path is the last argument of a transcoder command, so the
/// faststart flags go right before it.
pub fn with_tool_flags(argv: &[OsString], flavor: ToolFlavor, flags: ToolFlags) -> Vec<OsString> {
    let mut argv = argv.to_vec();
    if flavor != ToolFlavor::Transcoder || argv.is_empty() {
        return argv;
    }
    if flags.faststart && argv.len() >= 2 {
        let output = argv.len() - 1;
        argv.insert(output, os("+faststart"));
        argv.insert(output, os("-movflags"));
    }
    if flags.hide_banner {
        argv.insert(1, os("-hide_banner"));
    }
    argv
}

fn os(s: impl AsRef<OsStr>) -> OsString {
    s.as_ref().to_os_string()
}

/// Sink for scans that produce no file: `/dev/null`, or `NUL` on Windows.
pub fn null_sink() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Full diagnostic banner of the input (stream inventory, tags, duration).
pub fn probe_banner(tools: &Toolset, input: &Path) -> Vec<OsString> {
    vec![
        os(&tools.prober),
        os("-i"),
        os(input),
        os("-hide_banner"),
    ]
}

/// Decode the whole input through a filter without writing a file.
pub fn filter_scan(
    tools: &Toolset,
    input: &Path,
    filter_flag: &str,
    filter: &str,
) -> Vec<OsString> {
    vec![
        os(&tools.transcoder),
        os("-i"),
        os(input),
        os(filter_flag),
        os(filter),
        os("-f"),
        os("null"),
        os(null_sink()),
        os("-hide_banner"),
    ]
}

/// Decode the whole input to measure its real duration.
pub fn duration_scan(tools: &Toolset, input: &Path) -> Vec<OsString> {
    vec![
        os(&tools.transcoder),
        os("-i"),
        os(input),
        os("-f"),
        os("null"),
        os("-"),
    ]
}

/// Print only the value of one container tag.
pub fn format_tag(tools: &Toolset, input: &Path, tag: &str) -> Vec<OsString> {
    vec![
        os(&tools.prober),
        os("-v"),
        os("quiet"),
        os("-show_entries"),
        os(format!("format_tags={tag}")),
        os("-of"),
        os("default=nw=1:nk=1"),
        os(input),
    ]
}

/// Print `WxH` of the first video stream.
pub fn video_dimensions(tools: &Toolset, input: &Path) -> Vec<OsString> {
    vec![
        os(&tools.prober),
        os("-v"),
        os("error"),
        os("-select_streams"),
        os("v:0"),
        os("-show_entries"),
        os("stream=width,height"),
        os("-of"),
        os("csv=s=x:p=0"),
        os(input),
    ]
}

/// Dump all container metadata to an ffmetadata text file.
pub fn export_metadata(tools: &Toolset, input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        os(&tools.transcoder),
        os("-i"),
        os(input),
        os("-f"),
        os("ffmetadata"),
        os("-hide_banner"),
        os(output),
    ]
}

/// Copy every stream of `target` and the container metadata of `source`
/// into `output`.
pub fn copy_metadata(
    tools: &Toolset,
    target: &Path,
    source: &Path,
    output: &Path,
    copy_chapters: bool,
) -> Vec<OsString> {
    let mut argv = vec![
        os(&tools.transcoder),
        os("-i"),
        os(target),
        os("-i"),
        os(source),
    ];
    if !copy_chapters {
        argv.extend([os("-map_chapters"), os("-1")]);
    }
    argv.extend([
        os("-map"),
        os("0"),
        os("-c"),
        os("copy"),
        os("-map_metadata"),
        os("1"),
        os(output),
    ]);
    argv
}

/// Write the attached picture of `source` to `artwork` (a `.jpg`).
///
/// `0:v?` selects video streams and `-0:V?` drops every one that is not an
/// attached picture.
pub fn extract_artwork(tools: &Toolset, source: &Path, artwork: &Path) -> Vec<OsString> {
    vec![
        os(&tools.transcoder),
        os("-i"),
        os(source),
        os("-map"),
        os("0:v?"),
        os("-map"),
        os("-0:V?"),
        os("-c"),
        os("copy"),
        os(artwork),
    ]
}

/// How artwork gets embedded into a given container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkEmbed {
    /// ffmpeg writes a new file (the argv's last argument).
    Transcode(Vec<OsString>),
    /// AtomicParsley rewrites its first argument in place.
    InPlace(Vec<OsString>),
}

/// Embed `artwork` into `target`, writing to `output`.
///
/// `.mp3`/`.mp4` go through ffmpeg; `.m4a`/`.m4v` through AtomicParsley,
/// which edits `output` in place, so the caller copies `target` there first.
/// Other containers are not supported and yield `None`.
pub fn embed_artwork(
    tools: &Toolset,
    target: &Path,
    artwork: &Path,
    output: &Path,
) -> Option<ArtworkEmbed> {
    let ext = target.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "mp3" | "mp4" => Some(ArtworkEmbed::Transcode(vec![
            os(&tools.transcoder),
            os("-i"),
            os(target),
            os("-i"),
            os(artwork),
            os("-map"),
            os("0"),
            os("-c"),
            os("copy"),
            os("-map"),
            os("1"),
            os("-c:v:1"),
            os("png"),
            os("-disposition:v:1"),
            os("attached_pic"),
            os(output),
        ])),
        "m4a" | "m4v" => Some(ArtworkEmbed::InPlace(vec![
            os(&tools.tagger),
            os(output),
            os("--overWrite"),
            os("--artwork"),
            os(artwork),
        ])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(argv: &[OsString]) -> Vec<String> {
        argv.iter().map(|a| a.to_string_lossy().to_string()).collect()
    }

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_transcoder_flags() {
        let cmd = argv(&["ffmpeg", "-i", "in.mp4", "-c", "copy", "out.mp4"]);
        let flagged = with_tool_flags(&cmd, ToolFlavor::Transcoder, ToolFlags::default());
        assert_eq!(
            strings(&flagged),
            [
                "ffmpeg",
                "-hide_banner",
                "-i",
                "in.mp4",
                "-c",
                "copy",
                "-movflags",
                "+faststart",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn test_flags_disabled() {
        let cmd = argv(&["ffmpeg", "-i", "in.mp4", "out.mp4"]);
        let flags = ToolFlags {
            hide_banner: false,
            faststart: false,
        };
        assert_eq!(with_tool_flags(&cmd, ToolFlavor::Transcoder, flags), cmd);
    }

    #[test]
    fn test_tagger_untouched() {
        let cmd = argv(&["AtomicParsley", "a.m4a", "--overWrite"]);
        assert_eq!(
            with_tool_flags(&cmd, ToolFlavor::Tagger, ToolFlags::default()),
            cmd
        );
        assert_eq!(
            with_tool_flags(&cmd, ToolFlavor::Generic, ToolFlags::default()),
            cmd
        );
    }

    #[test]
    fn test_copy_metadata_chapters() {
        let tools = Toolset::default();
        let cmd = copy_metadata(
            &tools,
            Path::new("out.mp4"),
            Path::new("src.mp4"),
            Path::new("tmp/out.mp4"),
            false,
        );
        let cmd = strings(&cmd);
        assert_eq!(cmd[0], "ffmpeg");
        assert!(cmd.windows(2).any(|w| w == ["-map_chapters", "-1"]));
        assert!(cmd.windows(2).any(|w| w == ["-map_metadata", "1"]));
        assert_eq!(cmd.last().map(String::as_str), Some("tmp/out.mp4"));

        let with_chapters = copy_metadata(
            &tools,
            Path::new("out.mp4"),
            Path::new("src.mp4"),
            Path::new("tmp/out.mp4"),
            true,
        );
        assert!(!strings(&with_chapters).contains(&"-map_chapters".to_string()));
    }

    #[test]
    fn test_embed_artwork_by_container() {
        let tools = Toolset::default();
        let art = PathBuf::from("cover.jpg");

        let mp3 = embed_artwork(&tools, Path::new("a.mp3"), &art, Path::new("tmp/a.mp3"));
        assert!(matches!(mp3, Some(ArtworkEmbed::Transcode(_))));

        match embed_artwork(&tools, Path::new("a.M4A"), &art, Path::new("tmp/a.m4a")) {
            Some(ArtworkEmbed::InPlace(cmd)) => {
                assert_eq!(
                    strings(&cmd),
                    ["AtomicParsley", "tmp/a.m4a", "--overWrite", "--artwork", "cover.jpg"]
                );
            }
            other => panic!("unexpected embed plan: {other:?}"),
        }

        assert_eq!(
            embed_artwork(&tools, Path::new("a.mkv"), &art, Path::new("tmp/a.mkv")),
            None
        );
    }

    #[test]
    fn test_filter_scan_uses_null_sink() {
        let cmd = strings(&filter_scan(
            &Toolset::default(),
            Path::new("in.mp4"),
            "-vf",
            "cropdetect",
        ));
        assert!(cmd.windows(3).any(|w| w == ["-f", "null", null_sink()]));
    }
}
