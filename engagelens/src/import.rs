//! engagelens-import - CLI tool to load an export into the database
//!
//! Reads a JSON document of the form `{"profiles": [...], "content": [...]}`
//! and upserts every record by id.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/engagelens/data.db (~/.local/share/engagelens/data.db)
//! - Logs: $XDG_STATE_HOME/engagelens/engagelens.YYYY-MM-DD.log
//! - Config: $XDG_CONFIG_HOME/engagelens/config.toml (~/.config/engagelens/config.toml)

use anyhow::{Context, Result};
use clap::Parser;
use engagelens_core::{Config, Database, ImportDocument};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "engagelens-import")]
#[command(about = "Import profiles and content into the engagelens database")]
#[command(version)]
struct Args {
    /// JSON export to import
    file: PathBuf,

    /// Parse and validate the file without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        engagelens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(file = %args.file.display(), "engagelens-import starting");

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let doc: ImportDocument = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let untimestamped = doc.content.iter().filter(|c| c.timestamp.is_none()).count();
    if untimestamped > 0 {
        tracing::warn!(untimestamped, "Content without a timestamp will skip time-based sections");
    }

    if args.dry_run {
        println!("Dry run: nothing written.");
        println!("  Profiles: {}", doc.profiles.len());
        println!("  Content:  {}", doc.content.len());
        return Ok(());
    }

    // Open database
    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let summary = db.import(&doc).context("import failed")?;

    println!("Import complete:");
    println!("  Profiles upserted: {}", summary.profiles);
    println!("  Content upserted:  {}", summary.content);
    println!("  Without timestamp: {}", untimestamped);
    println!("  Total content:     {}", db.count_content()?);

    Ok(())
}
