//! # renderforge-av
//!
//! Drive ffmpeg-style media tools and make sense of what they print.
//!
//! This crate provides functionality for:
//! - Running external tools and capturing their diagnostic text
//! - Extracting tags, durations, stream listings, crop boxes and volume
//!   levels from that text
//! - Classifying stream listings into typed stream descriptors
//! - Rendering with precondition checks, and patching container metadata
//!   and artwork back into freshly rendered files
//!
//! All media work is delegated to `ffmpeg`, `ffprobe` and `AtomicParsley`;
//! nothing is decoded in-process.
//!
//! ## Example
//!
//! ```no_run
//! use renderforge_av::{Prober, StreamKind, Toolset};
//!
//! let tools = Toolset::default();
//! let prober = Prober::new(&tools, "/path/to/song.mp3")?;
//! for stream in prober.stream_descriptors()? {
//!     if stream.kind == StreamKind::Artwork {
//!         println!("stream {} is cover art", stream.index);
//!     }
//! }
//! println!("{:?} seconds", prober.duration_seconds()?);
//! # Ok::<(), renderforge_av::Error>(())
//! ```

pub mod command;
pub mod commands;
mod error;
pub mod parse;
pub mod probe;
pub mod query;
pub mod render;
pub mod streams;
pub mod timecode;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{Reporter, SilentReporter, ToolCommand, ToolOutput, TracingReporter};
pub use commands::{ToolFlags, ToolFlavor};
pub use error::{Error, Result};
pub use parse::{extract, Dialect, ExtractionPolicy, FfmpegDialect};
pub use probe::Prober;
pub use query::{MetadataField, MetadataQuery, MetadataValue};
pub use render::{
    PatchOutcome, PatchRequest, RenderJob, RenderOptions, RenderPipeline, RenderReport,
    RenderStatus,
};
pub use streams::{classify, StreamDescriptor, StreamKind};
pub use timecode::{describe_elapsed, format_timecode, to_seconds};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo, Toolset};
pub use workspace::ScratchDir;
