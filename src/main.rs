//! page-tester: runs the structural suites against the configured pages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use page_tester::{Error, FsLoader, HarnessConfig, OutputFormat, Runner, build_site_suites};

const DEFAULT_CONFIG: &str = "page-tester.toml";
const ABORT_EXIT_CODE: u8 = 2;

/// Structural test harness for static HTML pages
#[derive(Parser)]
#[command(name = "page-tester")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Harness config; `page-tester.toml` is used when present
    #[arg(long, env = "PAGE_TESTER_CONFIG")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "human")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(explicit: Option<&Path>) -> page_tester::Result<HarnessConfig> {
    match explicit {
        Some(path) => HarnessConfig::from_path(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            HarnessConfig::from_path(Path::new(DEFAULT_CONFIG))
        }
        None => Ok(HarnessConfig::default()),
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(root = %config.root.display(), pages = config.pages.len(), "loaded config");

    let suites = build_site_suites(&config)?;
    if suites.is_empty() {
        tracing::warn!(root = %config.root.display(), "no pages to test");
    }

    let loader = FsLoader::new(&config.root);
    let report = Runner::new(&loader)
        .run(&suites)
        .context("test run aborted")?;
    let rendered = report
        .render(cli.format)
        .context("could not render report")?;
    print!("{rendered}");
    Ok(report.exit_code() as u8)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(cause @ Error::Load { .. }) => eprintln!("{cause}"),
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::from(ABORT_EXIT_CODE)
        }
    }
}
