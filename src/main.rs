use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ihacdn_migrate::commands;
use ihacdn_migrate::config::Settings;
use ihacdn_migrate::output::Format;

#[derive(Parser)]
#[command(
    name = "ihacdn-migrate",
    version,
    about = "Move legacy disk-cache records and their uploads into the redis-backed store"
)]
struct Cli {
    /// Path to the settings file
    #[arg(long, short, global = true, default_value = "migrate.json")]
    config: PathBuf,
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe both stores and exit
    Check,
    /// Run the migration
    Run {
        /// Parse and classify every record without moving files or writing
        /// destination records
        #[arg(long)]
        dry_run: bool,
    },
}

fn run(cli: Cli) -> ihacdn_migrate::error::Result<()> {
    let settings = Settings::load(&cli.config)?;
    match cli.command {
        Commands::Check => commands::check::run(&settings, cli.format),
        Commands::Run { dry_run } => commands::migrate::run(&settings, dry_run, cli.format),
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;
    if let Err(e) = run(cli) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
