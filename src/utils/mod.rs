use anyhow::{Context, Result};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::builders::reporter::ConsoleReporter;
use crate::builders::rewriter::FileRewriter;
use crate::builders::rules::RulePipeline;
use crate::core::config::{ConfigManager, ConfigProvider, ExportFormat};
use crate::core::migrate::{Migration, MigrationMode, run_migration};
use crate::core::probe::{OutputFormat, ProbeRequest, run_probe};
use crate::core::rpc::RestClient;

/// Sets up `tracing` output on stderr; `-v` enables debug, `-vv` trace.
pub fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "app_devkit=debug",
        _ => "app_devkit=trace,reqwest=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(verbose >= 2)
        .with_writer(io::stderr)
        .init();

    debug!("app-devkit started with verbosity level: {verbose}");
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

pub fn initialize_config(config: Option<PathBuf>) -> Result<()> {
    let config_manager = get_config_manager(config)?;
    let path = config_manager.get_config_path()?;
    if config_manager.initialize()? {
        println!("✓ Wrote default configuration to {}", path.display());
    } else {
        println!("ℹ️  Configuration already exists at {}", path.display());
    }
    println!("Run 'app-devkit validate' to check the configured paths");
    Ok(())
}

pub fn validate_config(config: Option<PathBuf>) -> Result<()> {
    get_config_manager(config)?.validate_config()
}

pub fn show_config(config: Option<PathBuf>, format: ExportFormat) -> Result<()> {
    let content = get_config_manager(config)?.export_config(format)?;
    print!("{content}");
    Ok(())
}

/// Command-line overrides for the probe settings.
pub struct ProbeArgs {
    pub env_file: Option<PathBuf>,
    pub table: Option<String>,
    pub schema: Option<String>,
    pub format: OutputFormat,
    pub check_columns: Vec<String>,
}

pub fn probe_schema(config: Option<PathBuf>, args: ProbeArgs) -> Result<()> {
    let config_manager = get_config_manager(config)?;
    let settings = config_manager.load_config()?;

    let env_path = resolve_override(&config_manager, args.env_file, &settings.env.file);
    let request = ProbeRequest {
        table: args.table.unwrap_or(settings.probe.table),
        schema: args.schema.unwrap_or(settings.probe.schema),
        format: args.format,
        check_columns: args.check_columns,
    };

    let mut stdout = io::stdout();
    let outcome = run_probe(&env_path, &request, RestClient::new, &mut stdout)?;
    debug!("probe finished: {outcome:?}");
    Ok(())
}

pub fn fix_toasts(
    config: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    files: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    let config_manager = get_config_manager(config)?;
    let settings = config_manager.load_config()?;

    let base_dir = resolve_override(&config_manager, base_dir, &settings.toast.base_dir);
    let files = if files.is_empty() {
        settings.toast.files
    } else {
        files
    };

    if dry_run {
        println!("{}", "Dry run: no files will be written".yellow().bold());
    }

    let pipeline = RulePipeline::toast_api()?;
    let rewriter = FileRewriter::new(base_dir, &pipeline).dry_run(dry_run);
    debug!(
        "rewriting {} files under {} with rules {:?}",
        files.len(),
        rewriter.base_dir().display(),
        pipeline.rule_names()
    );

    let mut reporter = ConsoleReporter::stdout();
    rewriter.run(&files, &mut reporter)?;
    Ok(())
}

pub fn migrate(
    config: Option<PathBuf>,
    env_file: Option<PathBuf>,
    file: PathBuf,
    split: bool,
) -> Result<()> {
    let config_manager = get_config_manager(config)?;
    let settings = config_manager.load_config()?;
    let env_path = resolve_override(&config_manager, env_file, &settings.env.file);

    let migration = Migration::load(&env_path, &file)?;
    println!("📦 Applying migration: {}", migration.name);
    println!("🌐 Target database: {}", migration.credentials.url);

    let client = RestClient::new(&migration.credentials)?;
    let mode = if split {
        MigrationMode::Split
    } else {
        MigrationMode::Whole
    };

    let mut stdout = io::stdout();
    let summary = run_migration(&client, &migration.sql, mode, &mut stdout)
        .with_context(|| format!("Migration {} failed", migration.name))?;

    if !summary.is_clean() {
        anyhow::bail!("{} of {} statements failed", summary.failed, summary.total);
    }
    Ok(())
}

/// A command-line path is taken as given; a configured one is resolved
/// against the configuration's directory.
fn resolve_override(
    config_manager: &ConfigManager,
    from_cli: Option<PathBuf>,
    configured: &Path,
) -> PathBuf {
    from_cli.unwrap_or_else(|| config_manager.resolve(configured))
}

// Helper function to create ConfigManager instance
fn get_config_manager(config: Option<PathBuf>) -> Result<ConfigManager> {
    match config {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}
