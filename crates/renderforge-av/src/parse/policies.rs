//! The three extraction policies of the ffmpeg dialect.

use super::{first_content, ExtractionPolicy, Scanner};

/// Stream inventory: one line per `Stream #i:j...` entry.
///
/// Each entry contributes its description with the `Stream #` prefix
/// removed (`0:1(eng): Audio: aac ...`). Indented lines between entries
/// (per-stream `Metadata:` blocks, side data) are skipped; the listing ends
/// at the first unindented line that is not a stream entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamListing;

impl ExtractionPolicy for StreamListing {
    fn extract(&self, keyword: &str, tail: &str) -> Option<String> {
        let mut scanner = Scanner::new(&tail[keyword.len()..]);

        while let Some(line) = scanner.next_line() {
            let Some((idx, c)) = first_content(line) else {
                continue;
            };
            let content = &line[idx..];

            if c == '#' {
                scanner.push(&content[1..]);
            } else if let Some(entry) = content.strip_prefix("Stream") {
                let entry = entry.trim_start();
                scanner.push(entry.strip_prefix('#').unwrap_or(entry));
            } else if idx == 0 {
                scanner.terminate();
            }
        }

        Some(scanner.finish())
    }
}

/// Crop geometry reported by the `cropdetect` filter (`crop=W:H:X:Y`).
///
/// The first line that carries the keyword followed by `=` or a space
/// yields the geometry token after it. Occurrences glued to other words
/// (`Parsed_cropdetect_0`) are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropBox;

impl ExtractionPolicy for CropBox {
    fn extract(&self, keyword: &str, tail: &str) -> Option<String> {
        let mut scanner = Scanner::new(tail);

        while let Some(line) = scanner.next_line() {
            for (idx, _) in line.match_indices(keyword) {
                let after = &line[idx + keyword.len()..];
                if !after.starts_with(['=', ' ']) {
                    continue;
                }
                let geometry = after
                    .trim_start_matches(['=', ' '])
                    .split_whitespace()
                    .next()
                    .unwrap_or("");
                if !geometry.is_empty() {
                    scanner.push(geometry);
                    scanner.terminate();
                    break;
                }
            }
        }

        Some(scanner.finish())
    }
}

/// `key : value` tags, including values continued on following lines.
///
/// The value starts after the first colon. Following lines whose first
/// non-padding character is a colon continue the value; any other line ends
/// it. `start` and `Duration` drop everything after the first comma
/// (bitrate follows) and any leading zeros; `Duration` then drops a leading
/// colon left behind by sub-hour durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagValue;

impl ExtractionPolicy for TagValue {
    fn extract(&self, keyword: &str, tail: &str) -> Option<String> {
        let mut scanner = Scanner::new(&tail[keyword.len()..]);

        while let Some(line) = scanner.next_line() {
            match first_content(line) {
                None => continue,
                Some((idx, ':')) => scanner.push(line[idx + 1..].trim()),
                Some(_) => scanner.terminate(),
            }
        }

        let value = scanner.finish();
        let value = value.trim();

        let value = match keyword {
            "start" | "Duration" => {
                let timecode = value.split(',').next().unwrap_or("").trim();
                let timecode = timecode.trim_start_matches('0');
                if keyword == "Duration" {
                    timecode.strip_prefix(':').unwrap_or(timecode)
                } else {
                    timecode
                }
            }
            _ => value,
        };

        Some(value.to_string())
    }
}
