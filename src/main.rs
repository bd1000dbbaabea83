// logmux - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Colour mode selection
// 4. Building the directory provider and running the multiplexer

use clap::Parser;
use logmux::app::mux::{self, MuxOptions};
use logmux::core::model::Selector;
use logmux::core::source::SourceProvider;
use logmux::platform::config::{self, AppConfig, ColorMode, PlatformPaths};
use logmux::platform::dir_source::{DirectorySource, DirectorySourceConfig};
use logmux::util;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// logmux - tail many logs at once.
///
/// Every sub-directory of the source root is a source; every log file inside
/// it is a sub-source. Lines from all selected sub-sources are interleaved on
/// stdout, each prefixed with a coloured `[source sub-source]` tag.
#[derive(Parser, Debug)]
#[command(name = "logmux", version, about)]
struct Cli {
    /// Only tail this source (all sources if omitted).
    source: Option<String>,

    /// Only tail sub-sources with this exact name.
    #[arg(short = 'c', long = "sub-source", visible_alias = "container")]
    sub_source: Option<String>,

    /// Directory containing one sub-directory per source.
    #[arg(short = 'r', long = "root")]
    root: Option<PathBuf>,

    /// Config file to use instead of the platform default.
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Print existing content and exit instead of following.
    #[arg(long = "no-follow")]
    no_follow: bool,

    /// Print existing content before following new lines.
    #[arg(long = "from-start")]
    from_start: bool,

    /// When to colour source tags.
    #[arg(long = "color", value_enum)]
    color: Option<ColorMode>,

    /// List discovered sources and exit.
    #[arg(long = "list")]
    list: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, config_problems) = config::load_config(&config_path);

    util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "logmux starting"
    );

    for problem in &config_problems {
        tracing::warn!(error = %problem, "Config problem; using default");
    }

    apply_color_mode(cli.color.unwrap_or(app_config.color));

    let dir_source = DirectorySource::new(DirectorySourceConfig {
        root: cli.root.clone().unwrap_or_else(|| app_config.source_root.clone()),
        include_patterns: app_config.include_patterns.clone(),
        exclude_patterns: app_config.exclude_patterns.clone(),
    });
    tracing::debug!(root = %dir_source.root().display(), "Source root resolved");
    let provider: Arc<dyn SourceProvider> = Arc::new(dir_source);

    let result = if cli.list {
        list_sources(provider.as_ref())
    } else {
        run_mux(&cli, &app_config, provider)
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Colour precedence: LOGMUX_COLOR env var > --color > [output] color.
fn apply_color_mode(mode: ColorMode) {
    match std::env::var(util::constants::COLOR_ENV_VAR).as_deref() {
        Ok("true" | "1") => return colored::control::set_override(true),
        Ok("false" | "0") => return colored::control::set_override(false),
        _ => {}
    }
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn run_mux(
    cli: &Cli,
    app_config: &AppConfig,
    provider: Arc<dyn SourceProvider>,
) -> util::error::Result<()> {
    let selector = Selector::new(cli.source.clone(), cli.sub_source.clone());
    let options = MuxOptions {
        follow: !cli.no_follow,
        from_start: cli.from_start || app_config.from_start,
        channel_capacity: app_config.channel_capacity,
        poll_interval: app_config.poll_interval,
    };

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let cancel = Arc::new(AtomicBool::new(false));

    let summary = mux::run(provider, &selector, &mut sink, &options, cancel)?;

    for (descriptor, exit) in summary.exits.iter().filter(|(_, exit)| exit.is_failure()) {
        tracing::debug!(source = %descriptor, exit = ?exit, "Source ended with failure");
    }
    Ok(())
}

fn list_sources(provider: &dyn SourceProvider) -> util::error::Result<()> {
    let set = provider.list_sources()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut lines_written: u64 = 0;
    for entry in &set.entries {
        if entry.sub_sources.is_empty() {
            tracing::debug!(source = %entry.name, "Source has no sub-sources");
        }
        for sub in &entry.sub_sources {
            writeln!(out, "{}/{sub}", entry.name).map_err(|source| {
                util::error::SinkError::Write {
                    lines_written,
                    source,
                }
            })?;
            lines_written += 1;
        }
    }
    Ok(())
}
