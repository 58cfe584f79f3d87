//! Metadata requests and their results.

use crate::{Error, Result};
use serde::Serialize;

/// A value that can be requested from a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Artist,
    Album,
    Description,
    Lyrics,
    Genre,
    Composer,
    Track,
    Disc,
    Date,
    StartOffset,
    Comment,
    Title,
    Duration,
    Performer,
    /// Peak level reported by the `volumedetect` filter.
    MaxVolume,
    /// Description of the first audio stream.
    FirstAudioStream,
    /// Description of the first video stream.
    FirstVideoStream,
    /// Listing of every stream.
    Streams,
    /// Geometry reported by the `cropdetect` filter.
    CropDetect,
    /// `WxH` of the first video stream.
    Dimensions,
}

impl MetadataField {
    /// Every field, in catalog order.
    pub const ALL: [MetadataField; 20] = [
        MetadataField::Artist,
        MetadataField::Album,
        MetadataField::Description,
        MetadataField::Lyrics,
        MetadataField::Genre,
        MetadataField::Composer,
        MetadataField::Track,
        MetadataField::Disc,
        MetadataField::Date,
        MetadataField::StartOffset,
        MetadataField::Comment,
        MetadataField::Title,
        MetadataField::Duration,
        MetadataField::Performer,
        MetadataField::MaxVolume,
        MetadataField::FirstAudioStream,
        MetadataField::FirstVideoStream,
        MetadataField::Streams,
        MetadataField::CropDetect,
        MetadataField::Dimensions,
    ];

    /// Keyword the field is printed under in tool diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            MetadataField::Artist => "artist",
            MetadataField::Album => "album",
            MetadataField::Description => "description",
            MetadataField::Lyrics => "lyrics",
            MetadataField::Genre => "genre",
            MetadataField::Composer => "composer",
            MetadataField::Track => "track",
            MetadataField::Disc => "disc",
            MetadataField::Date => "date",
            MetadataField::StartOffset => "start",
            MetadataField::Comment => "comment",
            MetadataField::Title => "title",
            MetadataField::Duration => "Duration",
            MetadataField::Performer => "performer",
            MetadataField::MaxVolume => "max_volume",
            MetadataField::FirstAudioStream => "Audio",
            MetadataField::FirstVideoStream => "Video",
            MetadataField::Streams => "Stream",
            MetadataField::CropDetect => "crop",
            MetadataField::Dimensions => "dimensions",
        }
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl std::str::FromStr for MetadataField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let field = match s.to_lowercase().as_str() {
            "artist" | "author" => MetadataField::Artist,
            "album" => MetadataField::Album,
            "description" => MetadataField::Description,
            "lyrics" => MetadataField::Lyrics,
            "genre" => MetadataField::Genre,
            "composer" => MetadataField::Composer,
            "track" => MetadataField::Track,
            "disc" => MetadataField::Disc,
            "date" => MetadataField::Date,
            "start" => MetadataField::StartOffset,
            "comment" => MetadataField::Comment,
            "title" => MetadataField::Title,
            "duration" => MetadataField::Duration,
            "performer" => MetadataField::Performer,
            "max_volume" => MetadataField::MaxVolume,
            "audio" => MetadataField::FirstAudioStream,
            "video" => MetadataField::FirstVideoStream,
            "stream" | "streams" => MetadataField::Streams,
            "crop" => MetadataField::CropDetect,
            "dimensions" => MetadataField::Dimensions,
            _ => return Err(format!("Unknown metadata field: {}", s)),
        };
        Ok(field)
    }
}

/// Fields to fetch, each with its 1-based position in the result.
///
/// Positions must form the contiguous range `1..=N` without repeats; a
/// query that breaks this is rejected before any tool runs.
///
/// # Example
///
/// ```
/// use renderforge_av::{MetadataField, MetadataQuery};
///
/// let query = MetadataQuery::new()
///     .with(MetadataField::Title, 1)
///     .with(MetadataField::Composer, 3)
///     .with(MetadataField::Lyrics, 2);
/// assert_eq!(
///     query.ordered()?,
///     [MetadataField::Title, MetadataField::Lyrics, MetadataField::Composer]
/// );
/// # Ok::<(), renderforge_av::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataQuery {
    entries: Vec<(MetadataField, usize)>,
}

impl MetadataQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for `fields` in the given order.
    pub fn in_order(fields: impl IntoIterator<Item = MetadataField>) -> Self {
        fields
            .into_iter()
            .enumerate()
            .fold(Self::new(), |query, (i, field)| query.with(field, i + 1))
    }

    /// Request `field` at output `position`. Requesting the same field again
    /// moves it.
    pub fn with(mut self, field: MetadataField, position: usize) -> Self {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = position,
            None => self.entries.push((field, position)),
        }
        self
    }

    /// Number of requested fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field was requested.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate the query and return the fields in output order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] when no field is requested, a position
    /// repeats, or a position falls outside `1..=N`.
    pub fn ordered(&self) -> Result<Vec<MetadataField>> {
        if self.entries.is_empty() {
            return Err(Error::InvalidQuery(
                "at least one metadata value must be requested".to_string(),
            ));
        }

        let count = self.entries.len();
        let mut slots: Vec<Option<MetadataField>> = vec![None; count];

        for (field, position) in &self.entries {
            if *position < 1 || *position > count {
                return Err(Error::InvalidQuery(format!(
                    "output position {} for {} must be in range 1-{}",
                    position, field, count
                )));
            }
            if slots[position - 1].is_some() {
                return Err(Error::InvalidQuery(format!(
                    "output position {} can only be used once",
                    position
                )));
            }
            slots[position - 1] = Some(*field);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// One extracted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Text as printed by the tool.
    Text(String),
    /// A duration converted to seconds.
    Seconds(f64),
    /// The field is absent.
    NotFound,
}

impl MetadataValue {
    /// Wrap an optional extraction.
    pub fn from_text(value: Option<String>) -> Self {
        value.map_or(MetadataValue::NotFound, MetadataValue::Text)
    }

    /// Whether a value was found.
    pub fn is_found(&self) -> bool {
        !matches!(self, MetadataValue::NotFound)
    }

    /// Text value, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Seconds value, if this is one.
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            MetadataValue::Seconds(secs) => Some(*secs),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Text(text) => f.write_str(text),
            MetadataValue::Seconds(secs) => write!(f, "{}", secs),
            MetadataValue::NotFound => f.write_str("(not found)"),
        }
    }
}
