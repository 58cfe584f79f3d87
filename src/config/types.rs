use renderforge_av::{RenderOptions, ToolFlags};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

/// Overrides for the external tool locations. Unset tools are looked up
/// on `PATH`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub atomicparsley_path: Option<PathBuf>,
}

impl ToolsConfig {
    /// Configured overrides, paired with the tool each one replaces.
    pub fn overrides(&self) -> impl Iterator<Item = (&'static str, &PathBuf)> {
        [
            ("ffmpeg", self.ffmpeg_path.as_ref()),
            ("ffprobe", self.ffprobe_path.as_ref()),
            ("AtomicParsley", self.atomicparsley_path.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.map(|p| (name, p)))
    }
}

/// Default presentation and flag settings for renders.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Report each rendered output
    #[serde(default = "default_true")]
    pub print_success: bool,

    /// Report failed tool runs with their diagnostics
    #[serde(default = "default_true")]
    pub print_err: bool,

    /// Print the full tool diagnostics of successful runs
    #[serde(default)]
    pub print_info: bool,

    /// Report how long each render took
    #[serde(default = "default_true")]
    pub print_time: bool,

    /// Add `-movflags +faststart` to ffmpeg renders
    #[serde(default = "default_true")]
    pub faststart: bool,

    /// Add `-hide_banner` to ffmpeg renders
    #[serde(default = "default_true")]
    pub hide_banner: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            print_success: true,
            print_err: true,
            print_info: false,
            print_time: true,
            faststart: true,
            hide_banner: true,
        }
    }
}

impl RenderConfig {
    /// Pipeline options matching this configuration.
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            print_success: self.print_success,
            print_err: self.print_err,
            print_info: self.print_info,
            print_time: self.print_time,
            flags: ToolFlags {
                hide_banner: self.hide_banner,
                faststart: self.faststart,
            },
        }
    }
}
