mod cli;

use renderforge::config;
use renderforge_av::{
    commands::ToolFlavor, MetadataField, MetadataQuery, PatchOutcome, PatchRequest, Prober,
    RenderJob, RenderPipeline, StreamKind, Toolset, TracingReporter,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "renderforge=trace,renderforge_av=debug".to_string()
        } else {
            "renderforge=info,renderforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::Metadata { file, fields, json } => {
            print_metadata(&file, &fields, cli.config.as_deref(), json)
        }
        Commands::Crop { file } => crop_detect(&file, cli.config.as_deref()),
        Commands::ExportMetadata { file } => export_metadata(&file, cli.config.as_deref()),
        Commands::Render {
            inputs,
            outputs,
            patch_metadata,
            artwork,
            copy_chapters,
            no_faststart,
            raw,
            command,
        } => {
            let request = (patch_metadata || artwork).then(|| {
                PatchRequest::default()
                    .artwork(artwork)
                    .copy_chapters(copy_chapters)
            });
            render(
                RenderArgs {
                    inputs,
                    outputs,
                    command,
                    no_faststart,
                    raw,
                },
                request,
                cli.config.as_deref(),
            )
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("renderforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load config and resolve every tool up front.
fn load_tools(file: &Path, config_path: Option<&Path>) -> Result<Toolset> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    let config = config::load_config_or_default(config_path)?;
    config::resolve_tools(&config)
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let tools = load_tools(file, config_path)?;
    let prober = Prober::new(&tools, file)?;

    let streams = prober.stream_descriptors()?;
    let duration = prober.duration_seconds()?;

    if json {
        let value = serde_json::json!({
            "file": file,
            "duration": duration,
            "streams": streams,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    if let Some(secs) = duration {
        println!("Duration: {}", renderforge_av::format_timecode(secs));
    }

    println!("\nStreams: {}", streams.len());
    for stream in &streams {
        print!("  [{}] {}", stream.index, stream.kind);
        if let Some(ref lang) = stream.language {
            print!(" ({})", lang);
        }
        println!();
    }
    if streams.iter().any(|s| s.kind == StreamKind::Artwork) {
        println!("\nCover art present");
    }

    Ok(())
}

fn print_metadata(
    file: &Path,
    fields: &[String],
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let fields = fields
        .iter()
        .map(|f| f.parse::<MetadataField>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;

    let tools = load_tools(file, config_path)?;
    let values = Prober::new(&tools, file)?
        .with_reporter(&TracingReporter)
        .query(&MetadataQuery::in_order(fields.iter().copied()))?;

    if json {
        let mut map = serde_json::Map::new();
        for (field, value) in fields.iter().zip(&values) {
            map.insert(field.to_string(), serde_json::to_value(value)?);
        }
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (field, value) in fields.iter().zip(&values) {
        println!("{}:\n{}", field, value);
    }
    Ok(())
}

fn crop_detect(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let tools = load_tools(file, config_path)?;
    match Prober::new(&tools, file)?.crop_box()? {
        Some(crop) if crop.ends_with(":0:0") => println!("Nothing to crop ({})", crop),
        Some(crop) => println!("crop={}", crop),
        None => println!("No crop geometry detected"),
    }
    Ok(())
}

fn export_metadata(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let tools = load_tools(file, config_path)?;
    match Prober::new(&tools, file)?.export_metadata_file()? {
        Some(path) => println!("Metadata exported to {}", path.display()),
        None => anyhow::bail!("Metadata export of {:?} produced no file", file),
    }
    Ok(())
}

struct RenderArgs {
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    command: Vec<OsString>,
    no_faststart: bool,
    raw: bool,
}

/// Flavor of a command line, judged by its program name.
fn flavor_of(program: &Path) -> ToolFlavor {
    let name = program
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.as_str() {
        "ffmpeg" => ToolFlavor::Transcoder,
        "AtomicParsley" => ToolFlavor::Tagger,
        _ => ToolFlavor::Generic,
    }
}

fn render(
    args: RenderArgs,
    request: Option<PatchRequest>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = if request.is_some() {
        config::resolve_tools(&config)?
    } else {
        config::configured_tools(&config)
    };

    let mut command = args.command;
    let program = command
        .first()
        .map(PathBuf::from)
        .context("No command given")?;
    let flavor = if args.raw {
        ToolFlavor::Generic
    } else {
        flavor_of(&program)
    };
    // A bare tool name runs the configured binary.
    match flavor {
        ToolFlavor::Transcoder if program == Path::new("ffmpeg") => {
            command[0] = tools.transcoder.clone().into_os_string();
        }
        ToolFlavor::Tagger if program == Path::new("AtomicParsley") => {
            command[0] = tools.tagger.clone().into_os_string();
        }
        _ => {}
    }

    let mut options = config.render.options();
    if args.no_faststart {
        options.flags.faststart = false;
    }

    let job = RenderJob {
        inputs: args.inputs,
        outputs: args.outputs,
        command,
        flavor,
    };
    let pipeline = RenderPipeline::new(&tools).with_options(options);

    match request {
        None => {
            let report = pipeline.render(&job)?;
            if !report.is_rendered() {
                anyhow::bail!("Render failed");
            }
        }
        Some(request) => match pipeline.render_and_patch(&job, &request)? {
            PatchOutcome::Patched => {
                println!("Rendered and patched {} output(s)", job.outputs.len());
            }
            PatchOutcome::Unpatched(outputs) => {
                for out in outputs {
                    println!("Rendered {} without patching its metadata", out.display());
                }
            }
        },
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = renderforge_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            for (tool, path) in config.tools.overrides() {
                println!("  {}: {}", tool, path.display());
            }
            print_render_defaults(&config.render);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_render_defaults(&config.render);
        }
    }

    Ok(())
}

fn print_render_defaults(render: &config::RenderConfig) {
    println!("  Faststart: {}", render.faststart);
    println!("  Hide banner: {}", render.hide_banner);
    println!("  Print render time: {}", render.print_time);
}
