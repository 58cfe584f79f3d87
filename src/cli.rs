use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "renderforge")]
#[command(author, version, about = "Render and inspect media files through ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a media file and display its streams and duration
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print metadata values of a media file in the order given
    Metadata {
        /// File to read
        #[arg(required = true)]
        file: PathBuf,

        /// Fields to print (title, artist, Duration, Stream, crop, max_volume, ...)
        #[arg(required = true)]
        fields: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect black bars and print the crop geometry
    Crop {
        /// File to scan
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Export the container metadata to <stem>-METADATA.txt
    ExportMetadata {
        /// File to read
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Run a render command and optionally patch metadata back into its outputs
    Render {
        /// Input files the command reads (the first is the metadata source)
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,

        /// Output files the command produces
        #[arg(short, long = "output", required = true)]
        outputs: Vec<PathBuf>,

        /// Copy the first input's metadata into every output afterwards
        #[arg(long)]
        patch_metadata: bool,

        /// Also reattach the first input's artwork (implies --patch-metadata)
        #[arg(long)]
        artwork: bool,

        /// Keep chapters when patching metadata
        #[arg(long)]
        copy_chapters: bool,

        /// Do not add -movflags +faststart
        #[arg(long)]
        no_faststart: bool,

        /// Do not add ffmpeg flags at all (for non-ffmpeg commands)
        #[arg(long)]
        raw: bool,

        /// Command to run, program first
        #[arg(last = true, required = true)]
        command: Vec<OsString>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
