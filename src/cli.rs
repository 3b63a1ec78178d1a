use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repo_layout::render::OutputFormat;
use tracing_subscriber::EnvFilter;

use crate::commands;

/// Root CLI for repo-layout
#[derive(Parser)]
#[command(name = "repo-layout")]
#[command(about = "Shared bin/obj output roots for every project in a repository")]
pub struct Cli {
    /// Log every probed directory
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of repo-layout.{yml,yaml,toml} in the current directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the repository root and its src/bin/obj children
    Root {
        /// Directory to resolve from (defaults to the current directory)
        dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Print the output paths of one or more projects
    Paths {
        /// Project directories (defaults to the current directory)
        dirs: Vec<PathBuf>,
        /// Global property, e.g. `-p Configuration=Release -p Platform=x64`
        #[arg(short = 'p', long = "property", value_name = "NAME=VALUE")]
        properties: Vec<String>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Fail when bin/obj directories exist inside project sources
    Check {
        /// Project directories (defaults to the current directory)
        dirs: Vec<PathBuf>,
    },
    /// Pin the repository root by creating src/.RepoSrcRoot
    Init {
        /// Repository root (defaults to the current directory)
        dir: Option<PathBuf>,
    },
}

/// Dispatch after parse
pub fn run() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match commands::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error (config): {e:#}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Root { dir, format } => {
            if let Err(e) = commands::root(&settings, dir.as_deref(), format) {
                eprintln!("error (root): {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Paths {
            dirs,
            properties,
            format,
        } => {
            if let Err(e) = commands::paths(&settings, &dirs, &properties, format) {
                eprintln!("error (paths): {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Check { dirs } => {
            if let Err(e) = commands::check(&dirs) {
                eprintln!("error (check): {e:#}");
                std::process::exit(1);
            }
        }
        Commands::Init { dir } => {
            if let Err(e) = commands::init(&settings, dir.as_deref()) {
                eprintln!("error (init): {e:#}");
                std::process::exit(1);
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
