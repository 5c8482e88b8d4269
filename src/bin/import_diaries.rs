//! Tooling for moving a legacy diary into the store.
//!
//! `convert` turns the old plain-text diary into the JSON export format,
//! `import` loads that export into one user's diary (existing dates are
//! overwritten), and `check` reports what the store holds afterwards.
//! `import` and `check` use the same database environment as the server
//! (`ENV`, `DATABASE_URL`, `DB_*`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use feelog_api::config::Config;
use feelog_api::db::Database;
use feelog_api::usecases::diary::DiaryUsecase;
use feelog_api::usecases::import::{
    import_entries, parse_legacy_text, score_histogram, summarize, DiaryReport, LegacyExport,
};

#[derive(Debug, Parser)]
#[command(name = "import-diaries", about = "Convert, import and check legacy diaries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a JSON export into one user's diary
    Import {
        /// Owner of the imported entries.
        #[arg(long)]
        user_id: Uuid,

        /// JSON file shaped as `{ "entries": [{ "date", "mental", "content" }], "total" }`.
        #[arg(long)]
        file: PathBuf,
    },

    /// Print entry count, newest entries and the score histogram
    Check {
        /// Restrict the report to one user. All users when omitted.
        #[arg(long)]
        user_id: Option<Uuid>,
    },

    /// Convert a plain-text diary into the JSON export format
    Convert {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Year for `M/D` date lines.
        #[arg(long, default_value_t = 2025)]
        year: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feelog_api=info,import_diaries=info".into()),
        )
        .init();

    match Cli::parse().command {
        Commands::Import { user_id, file } => import(user_id, &file).await,
        Commands::Check { user_id } => check(user_id).await,
        Commands::Convert {
            input,
            output,
            year,
        } => convert(&input, &output, year).await,
    }
}

async fn connect() -> anyhow::Result<Database> {
    let config = Config::from_env()?;
    let db = Database::connect(&config).await?;
    db.migrate().await?;
    Ok(db)
}

async fn import(user_id: Uuid, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let export: LegacyExport = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if let Some(total) = export.total {
        if total != export.entries.len() {
            tracing::warn!(
                declared = total,
                found = export.entries.len(),
                "Export total does not match the number of entries"
            );
        }
    }
    tracing::info!(entries = export.entries.len(), "Loaded legacy export");

    let db = connect().await?;
    let repo = db.diary_repository();
    let summary = import_entries(repo.as_ref(), user_id, &export.entries).await;

    tracing::info!(
        user_id = %user_id,
        created = summary.created,
        updated = summary.updated,
        failed = summary.failed,
        "Import finished"
    );

    Ok(())
}

async fn check(user_id: Option<Uuid>) -> anyhow::Result<()> {
    let db = connect().await?;
    let diaries = DiaryUsecase::new(db.diary_repository());

    let stored = match user_id {
        Some(id) => diaries.list(id).await?,
        None => diaries.all().await?,
    };
    print_report(&summarize(&stored));
    Ok(())
}

fn print_report(report: &DiaryReport) {
    println!("Diaries stored: {}", report.total);
    println!();
    println!("Latest {} entries:", report.latest.len());
    for line in &report.latest {
        println!("{}  mental {}", line.date, line.mental);
        println!("  {}", line.preview);
    }
    println!();
    print_histogram(&report.histogram);
}

fn print_histogram(histogram: &[usize; 10]) {
    println!("Score histogram:");
    for (i, count) in histogram.iter().enumerate() {
        println!("  {:>2}: {}", i + 1, count);
    }
}

async fn convert(input: &Path, output: &Path, year: i32) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let entries = parse_legacy_text(&text, year)?;
    let export = LegacyExport {
        total: Some(entries.len()),
        entries,
    };

    let unscored: Vec<&str> = export
        .entries
        .iter()
        .filter(|e| e.mental == 0)
        .map(|e| e.date.as_str())
        .collect();
    let histogram = score_histogram(export.entries.iter().map(|e| e.mental));

    let json = serde_json::to_string_pretty(&export)?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        entries = export.entries.len(),
        output = %output.display(),
        "Converted text diary"
    );
    print_histogram(&histogram);
    if !unscored.is_empty() {
        println!();
        println!("Entries without a score (imported as the default):");
        for date in unscored {
            println!("  {date}");
        }
    }
    Ok(())
}
