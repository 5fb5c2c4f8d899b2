//! mkreader - a terminal Markdown reader with document tabs.
//!
//! # Usage
//!
//! ```bash
//! mkreader README.md CHANGELOG.md
//! mkreader --no-outline --max-tabs 4 docs/*.md
//! mkreader --export html --output out.html README.md
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mkreader::app::App;
use mkreader::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags, snapshot_path,
};
use mkreader::export::{ExportCoordinator, ExportFormat};
use mkreader::gateway::FsGateway;
use mkreader::highlight::{HighlightBackground, set_background_mode};
use mkreader::perf;
use mkreader::pipeline::RenderPipeline;
use mkreader::session::{MemorySnapshotStore, SessionManager};
use mkreader::view::MemorySurface;

/// A terminal Markdown reader with tabs, an outline and live reload
#[derive(Parser, Debug)]
#[command(name = "mkreader", version, about, long_about = None)]
struct Cli {
    /// Markdown files to open; the first one becomes the active tab
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Start with the outline hidden
    #[arg(long)]
    no_outline: bool,

    /// Do not reopen the tabs from the previous session
    #[arg(long)]
    no_restore: bool,

    /// Do not reload documents when their files change
    #[arg(long)]
    no_watch: bool,

    /// Leave mermaid code blocks as source
    #[arg(long)]
    no_diagrams: bool,

    /// Disable syntax highlighting of code blocks
    #[arg(long)]
    no_highlight: bool,

    /// Maximum number of open documents
    #[arg(long, value_name = "N")]
    max_tabs: Option<usize>,

    /// Force the color palette (light or dark)
    #[arg(long, value_enum, default_value = "auto")]
    theme: ThemeMode,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write render and watcher debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Export the first document instead of starting the viewer (html)
    #[arg(long, value_name = "FORMAT", value_parser = parse_export_format)]
    export: Option<ExportFormat>,

    /// Destination for --export (defaults to <name>-<date>.<ext>)
    #[arg(long, value_name = "PATH", requires = "export")]
    output: Option<PathBuf>,

    /// Write log output to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    ExportCoordinator::new().parse_format(value)
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

fn effective_flags(cli: &Cli, raw_args: &[String]) -> Result<(ConfigFlags, PathBuf, PathBuf)> {
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
        tracing::info!(path = %global_path.display(), "saved default flags");
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    Ok((file_flags.union(&cli_flags), global_path, local_path))
}

fn apply_theme(theme: ThemeMode) {
    match theme {
        ThemeMode::Auto => set_background_mode(None),
        ThemeMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        ThemeMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }
}

fn export_headless(
    files: &[PathBuf],
    flags: &ConfigFlags,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let mut options = flags.session_options();
    options.watch_enabled = false;
    let mut session = SessionManager::new(
        FsGateway::new(),
        MemorySnapshotStore::new(),
        MemorySurface::new(),
        options,
    )
    .with_pipeline(RenderPipeline::standard(
        !flags.no_diagrams,
        !flags.no_highlight,
    ));

    let report = session.startup(files, false);
    if let Some(err) = report.error {
        return Err(anyhow::Error::new(err).context("Failed to open document for export"));
    }
    if report.opened.is_none() {
        anyhow::bail!("No Markdown file to export");
    }
    session.settle();

    let outcome = ExportCoordinator::new()
        .export(&session, format, output)
        .with_context(|| format!("Failed to export {format}"))?;
    println!("{}", outcome.path.display());
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let (effective, global_path, local_path) = effective_flags(&cli, &raw_args)?;

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MKREADER_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            error = %err,
            "failed to initialize render debug log"
        );
    }

    apply_theme(effective.theme.unwrap_or(ThemeMode::Auto));

    if let Some(format) = cli.export {
        return export_headless(&cli.files, &effective, format, cli.output.as_deref());
    }

    for missing in cli.files.iter().filter(|path| !path.exists()) {
        tracing::warn!(path = %missing.display(), "file not found");
    }

    let mut app = App::new(cli.files, snapshot_path())
        .with_restore(!effective.no_restore)
        .with_outline_visible(!effective.no_outline)
        .with_passes(!effective.no_diagrams, !effective.no_highlight)
        .with_options(effective.session_options())
        .with_config_paths(
            Some(global_path),
            local_path.exists().then_some(local_path),
        );

    app.run().context("Application error")
}
