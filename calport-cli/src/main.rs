mod commands;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use calport_core::{LocalStore, MigratorConfig};
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "calport")]
#[command(about = "Export calendars to ICS files and import them back")]
struct Cli {
    /// More output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Calendar store directory, overrides store_dir from the config file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a user's calendars, one .ics file per calendar
    Export {
        #[arg(short, long)]
        user: String,

        /// Directory to write the files to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Only export this calendar (by uri)
        #[arg(short, long)]
        calendar: Option<String>,
    },
    /// Import .ics files as new calendars
    Import {
        #[arg(short, long)]
        user: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List a user's calendars
    List {
        #[arg(short, long)]
        user: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = MigratorConfig::load().context("Could not load configuration")?;
    let store_dir = cli.store.unwrap_or_else(|| config.store_path());
    tracing::debug!(store = %store_dir.display(), "Using calendar store");
    let store = LocalStore::new(store_dir);

    match cli.command {
        Commands::Export { user, out, calendar } => {
            commands::export::run(&store, &config, &user, &out, calendar.as_deref())
        }
        Commands::Import { user, files } => commands::import::run(&store, &config, &user, &files),
        Commands::List { user } => commands::list::run(&store, &user),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
