//! Small helpers for day-to-day work on the web application:
//! - `probe` asks the database service which columns a table has,
//!   through the `exec_sql` remote procedure.
//! - `fix-toasts` moves UI components from the object-payload
//!   `toast({ title, description, variant })` call to
//!   `toast.success(...)` / `toast.error(...)`.
//! - `migrate` pushes a SQL migration file through the same procedure.
use anyhow::Result;
use app_devkit::core::config::ExportFormat;
use app_devkit::core::probe::OutputFormat;
use app_devkit::utils::{self, ProbeArgs};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "app-devkit")]
#[command(about = "Schema probe, toast API rewriter and migration runner for the web app")]
#[command(version)]
struct Cli {
    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the tool configuration file (default: ./app-devkit.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write app-devkit.toml with the default settings
    Init,
    /// Check the configuration and the paths it points at
    Validate,
    /// Print the effective configuration
    ShowConfig {
        #[arg(long, value_enum, default_value_t)]
        format: ExportFormat,
    },
    /// List a table's columns through the exec_sql RPC
    Probe {
        /// Env file holding the service URL and keys
        #[arg(long, value_name = "PATH")]
        env_file: Option<PathBuf>,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        schema: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Column to check directly if the RPC call fails (repeatable)
        #[arg(long = "check-column", value_name = "COLUMN")]
        check_columns: Vec<String>,
    },
    /// Rewrite toast({...}) calls into toast.success(...) / toast.error(...)
    FixToasts {
        /// Directory the file list is relative to
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
        /// Files to process instead of the configured list
        files: Vec<String>,
    },
    /// Apply a SQL migration file through the exec_sql RPC
    Migrate {
        file: PathBuf,
        /// Send one statement at a time and report a summary
        #[arg(long)]
        split: bool,
        #[arg(long, value_name = "PATH")]
        env_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Init => utils::initialize_config(cli.config),
        Commands::Validate => utils::validate_config(cli.config),
        Commands::ShowConfig { format } => utils::show_config(cli.config, format),
        Commands::Probe {
            env_file,
            table,
            schema,
            format,
            check_columns,
        } => utils::probe_schema(
            cli.config,
            ProbeArgs {
                env_file,
                table,
                schema,
                format,
                check_columns,
            },
        ),
        Commands::FixToasts {
            base_dir,
            dry_run,
            files,
        } => utils::fix_toasts(cli.config, base_dir, files, dry_run),
        Commands::Migrate {
            file,
            split,
            env_file,
        } => utils::migrate(cli.config, env_file, file, split),
    }
}
