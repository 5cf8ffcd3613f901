//! mail-transcript - Export a hierarchical mail archive into one transcript.
//!
//! Walks every folder of the archive depth-first and appends one fixed
//! layout text record per message to a single UTF-8 file. Damaged messages
//! and folders are skipped and reported; they never abort the run.
//!
//!   mail-transcript export ./mailbox -o mailbox.txt
//!   mail-transcript export Inbox.mbox -d transcripts --max-body-length 10000
//!   mail-transcript tree ./mailbox

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_errors_table, format_summary, format_summary_json, format_tree, inspect_archive,
    ExportOptions, Exporter, TracingEventSink,
};
use cli::{Cli, Commands};
use domain::AppConfig;
use infrastructure::{
    ensure_config_exists, load_config, render_config, resolve_destination, Html2TextConverter,
    MailDirProvider,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            source,
            output,
            output_dir,
            max_body_length,
            json,
        } => {
            cmd_export(
                &config,
                &source,
                output.as_deref(),
                output_dir,
                max_body_length,
                json,
            )?;
        }
        Commands::Tree { source } => {
            cmd_tree(&source)?;
        }
        Commands::Config { init } => {
            cmd_config(&config, cli.config.as_deref(), init)?;
        }
    }

    Ok(())
}

/// Export an archive to a transcript file.
fn cmd_export(
    config: &AppConfig,
    source: &Path,
    output: Option<&Path>,
    output_dir: Option<PathBuf>,
    max_body_length: Option<usize>,
    json: bool,
) -> domain::Result<()> {
    let mut options = ExportOptions::from(&config.export);
    if max_body_length.is_some() {
        options.max_body_length = max_body_length;
    }

    let output_dir = output_dir.or_else(|| config.export.output_dir.clone());
    let destination = resolve_destination(
        source,
        output,
        output_dir.as_deref(),
        &chrono::Local::now(),
    );

    let provider = MailDirProvider;
    let html = Html2TextConverter::new(config.export.html_wrap_width);
    let summary = Exporter::new(&provider, &html, options).run(
        source,
        &destination,
        &mut TracingEventSink,
    )?;

    if json {
        println!("{}", format_summary_json(&summary)?);
        return Ok(());
    }

    println!("{}", format_summary(&summary));
    if !summary.errors.is_empty() {
        println!();
        println!("{}", format_errors_table(&summary.errors));
    }

    Ok(())
}

/// Show the folder tree of an archive.
fn cmd_tree(source: &Path) -> domain::Result<()> {
    let tree = inspect_archive(&MailDirProvider, source)?;
    println!("{}", format_tree(&tree));
    Ok(())
}

/// Show or initialise the configuration.
fn cmd_config(config: &AppConfig, path: Option<&Path>, init: bool) -> domain::Result<()> {
    if init {
        let written = ensure_config_exists(path)?;
        println!("{} Configuration file: {}", "✓".green().bold(), written.display());
        return Ok(());
    }

    let shown = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);
    println!("{} {}", "⚙ Configuration".bold(), shown.display());
    println!();
    print!("{}", render_config(config)?);

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
