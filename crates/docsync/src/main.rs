use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use docsync_core::algolia::{AlgoliaClient, DryRunIndex};
use docsync_core::config::{DEFAULT_CONFIG_FILENAME, Settings, SettingsOverrides, load_config};
use docsync_core::permalink::normalize_path;
use docsync_core::sync::{SyncOptions, SyncReport, sync_site};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "docsync",
    version,
    about = "Rebuild the documentation search index from the static site build"
)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Config file (default: ./docsync.toml)")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Static site build directory")]
    build_dir: Option<PathBuf>,
    #[arg(long, value_name = "NAME", help = "Search index to replace")]
    index: Option<String>,
    #[arg(long, help = "Parse and count records without touching the index")]
    dry_run: bool,
    #[arg(long, value_name = "PATH", help = "Also write all records as JSON")]
    output: Option<PathBuf>,
    #[arg(long, help = "Print resolved settings")]
    diagnostics: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = resolve_settings(&cli)?;
    if cli.diagnostics {
        println!("[diagnostics]\n{}\n", settings.diagnostics());
    }

    let options = SyncOptions {
        keep_records: cli.output.is_some(),
    };
    let report = if cli.dry_run {
        let mut index = DryRunIndex::default();
        sync_site(&settings.site, &mut index, &options)?
    } else {
        let mut index = AlgoliaClient::new(&settings.algolia)?;
        sync_site(&settings.site, &mut index, &options)?
    };

    if let Some(output) = &cli.output {
        write_records(output, &report)?;
    }
    print_report(&settings, &report, cli.dry_run, cli.output.as_deref());
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let config = load_config(&config_path)?;
    let overrides = SettingsOverrides {
        build_dir: cli.build_dir.clone(),
        index_name: cli.index.clone(),
    };
    Settings::resolve(&config, &overrides)
}

fn write_records(path: &Path, report: &SyncReport) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let rendered =
        serde_json::to_string_pretty(&report.records).context("failed to serialize records")?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}

fn print_report(settings: &Settings, report: &SyncReport, dry_run: bool, output: Option<&Path>) {
    println!("docsync");
    println!("build_dir: {}", normalize_path(&settings.site.build_dir));
    println!("index: {}", settings.algolia.index_name);
    println!("dry_run: {}", format_flag(dry_run));
    println!("directories.scanned: {}", report.directories_scanned);
    println!("directories.excluded: {}", report.directories_excluded);
    println!("directories.uploaded: {}", report.uploads.len());
    println!("records.text: {}", report.text_records);
    println!("records.parameter: {}", report.parameter_records);
    println!("records.total: {}", report.total_records());
    println!("request_count: {}", report.request_count);
    if let Some(output) = output {
        println!("output: {}", normalize_path(output));
    }
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
