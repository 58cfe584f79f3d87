mod types;

pub use types::*;

use anyhow::{Context, Result};
use renderforge_av::Toolset;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./renderforge.toml",
        "~/.config/renderforge/config.toml",
        "/etc/renderforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Resolve the external tools, honoring configured overrides.
pub fn resolve_tools(config: &Config) -> Result<Toolset> {
    let tools = &config.tools;
    Toolset::resolve(
        tools.ffmpeg_path.as_deref(),
        tools.ffprobe_path.as_deref(),
        tools.atomicparsley_path.as_deref(),
    )
    .context("Failed to locate external tools")
}

/// Tools from configured overrides, falling back to bare program names
/// resolved at spawn time.
pub fn configured_tools(config: &Config) -> Toolset {
    let defaults = Toolset::default();
    let tools = &config.tools;
    Toolset {
        transcoder: tools.ffmpeg_path.clone().unwrap_or(defaults.transcoder),
        prober: tools.ffprobe_path.clone().unwrap_or(defaults.prober),
        tagger: tools.atomicparsley_path.clone().unwrap_or(defaults.tagger),
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    for (tool, path) in config.tools.overrides() {
        if path.is_dir() {
            anyhow::bail!("Configured {} path is a directory: {:?}", tool, path);
        }
        if !path.exists() {
            tracing::warn!("Configured {} path does not exist: {:?}", tool, path);
        }
    }

    Ok(())
}
