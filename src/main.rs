use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod activity;
mod cell;
mod columns;
mod db;
mod error;
mod import;
mod logging;
#[cfg(test)]
mod memory;
mod models;
mod ranking;
mod resolve;
mod sheet;
mod store;

use crate::db::PgStore;
use crate::ranking::AgeFilter;
use crate::store::Store;

#[derive(Parser)]
#[command(name = "weekly-ranking")]
#[command(about = "Weekly activity points, spreadsheet import and ranking for children", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import weekly scores from a spreadsheet export (CSV)
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Date given to weeks created by this import (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Rank children by total points
    #[command(group(
        ArgGroup::new("age")
            .args(["max_age", "min_age"])
            .multiple(false)
    ))]
    Ranking {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=12))]
        max_age: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=12))]
        min_age: Option<u8>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Set group label and/or age for children with this exact name
    SetChild {
        #[arg(long)]
        name: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=12))]
        age: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_json)?;

    let pool = PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(&cli.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { file, today } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let summary = import::import_sheet(&store, &bytes, today)
                .await
                .with_context(|| format!("import of {} failed", file.display()))?;
            let weeks: Vec<String> = summary.weeks_processed.iter().map(i32::to_string).collect();
            println!(
                "Imported {} results for {} children across weeks {}.",
                summary.results_created,
                summary.children_seen,
                weeks.join(", ")
            );
        }
        Commands::Ranking {
            max_age,
            min_age,
            limit,
            json,
        } => {
            let filter = max_age
                .map(AgeFilter::AtMost)
                .or(min_age.map(AgeFilter::AtLeast));
            let children = store.list_children().await?;
            let results = store.list_scored_results().await?;
            let mut entries = ranking::rank(&children, &results, filter);
            if let Some(limit) = limit {
                entries.truncate(limit);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No children to rank.");
            } else {
                for entry in &entries {
                    let medal = entry
                        .medal
                        .map(|m| format!(" [{}]", m.as_str()))
                        .unwrap_or_default();
                    println!("{:>3}. {} {} pts{}", entry.position, entry.name, entry.total, medal);
                }
            }
        }
        Commands::SetChild { name, group, age } => {
            let updated = store.update_child(&name, group.as_deref(), age).await?;
            if updated == 0 {
                anyhow::bail!("no child named {name:?}");
            }
            println!("Updated {updated} child record(s).");
        }
    }

    Ok(())
}
