use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

mod aggregate;
mod db;
mod errors;
mod models;
mod ranking;
mod report;
mod roster;
mod submit;
mod week;

use models::ScoreType;
use submit::RawEntry;

#[derive(Parser)]
#[command(name = "cleanliness-scores")]
#[command(about = "Weekly class cleanliness scoring and grade rankings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Submit a batch of score deltas for one date and category
    Submit {
        /// Scoring date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Scoring category: classroom or exterior
        #[arg(long = "type")]
        score_type: ScoreType,
        /// CLASS=SCORE pair, repeatable (e.g. --entry 101=2)
        #[arg(long = "entry", required = true)]
        entries: Vec<RawEntry>,
        /// Free-text note attached to every record in the batch
        #[arg(long)]
        note: Option<String>,
        /// Stable rater identifier
        #[arg(long, env = "RATER_UID")]
        rater: String,
    },
    /// Delete one score record
    Delete {
        #[arg(long)]
        id: Uuid,
    },
    /// Delete every score record, in sequential atomic batches
    ClearAll,
    /// Replace the roster configuration
    SetRoster {
        /// GRADE=COUNT pair, repeatable (e.g. --grade 1=4)
        #[arg(long = "grade", required = true)]
        grades: Vec<String>,
    },
    /// Show the weekly breakdown for the week containing a date
    Aggregate {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show grade rankings for a week
    Rank {
        /// Week label such as 2026-W06, defaults to the current week
        #[arg(long)]
        week: Option<String>,
        /// Shift the viewed week, e.g. -1 for last week
        #[arg(long, default_value_t = 0)]
        delta_weeks: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the current roster configuration
    Roster,
    /// List raw score records, newest first
    #[command(group(
        ArgGroup::new("scope")
            .args(["grade", "class"])
            .multiple(false)
    ))]
    History {
        #[arg(long)]
        grade: Option<u32>,
        #[arg(long)]
        class: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Import score records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Write a markdown report for a week
    Report {
        #[arg(long)]
        week: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Submit {
            date,
            score_type,
            entries,
            note,
            rater,
        } => {
            let date = resolve_date(date.as_deref())?;
            let roster = db::fetch_roster(&pool).await?;
            let batch = submit::prepare_batch(
                &entries,
                date,
                score_type,
                note.as_deref(),
                &rater,
                &roster,
            )?;
            let committed = db::submit_batch(&pool, &batch).await?;
            println!(
                "Committed {committed} {score_type} scores for week {}.",
                batch.records[0].week
            );
            for entry in &batch.rejected {
                println!("Skipped invalid entry {}={}.", entry.class_id, entry.score);
            }
        }
        Commands::Delete { id } => {
            db::delete_record(&pool, id).await?;
            println!("Record {id} deleted.");
        }
        Commands::ClearAll => {
            let summary = db::clear_all(&pool).await?;
            println!("Deleted {} records.", summary.deleted);
        }
        Commands::SetRoster { grades } => {
            let counts = parse_grade_counts(&grades)?;
            db::set_roster(&pool, &counts).await?;
            println!("Roster updated for {} grades.", counts.len());
        }
        Commands::Aggregate { date, json } => {
            let date = resolve_date(date.as_deref())?;
            let roster = db::fetch_roster(&pool).await?;
            let records = db::fetch_records(&pool).await?;
            let stats = aggregate::aggregate(&records, date, &roster);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!("Weekly breakdown for {} ({date}):", week::week_label(date));
            for (class_id, breakdown) in &stats {
                println!(
                    "- {class_id}: classroom {:+}, exterior {:+}, total {:+}",
                    breakdown.classroom, breakdown.exterior, breakdown.total
                );
            }
        }
        Commands::Rank {
            week: week_arg,
            delta_weeks,
            json,
        } => {
            let base = week_arg.unwrap_or_else(|| week::week_label(Utc::now().date_naive()));
            let target_week = week::shift_week(&base, delta_weeks)?;
            let roster = db::fetch_roster(&pool).await?;
            let records = db::fetch_records(&pool).await?;
            let rankings = ranking::rank(&records, &target_week, &roster);
            if json {
                println!("{}", serde_json::to_string_pretty(&rankings)?);
                return Ok(());
            }
            println!("Rankings for {target_week}:");
            for (grade, entries) in &rankings {
                println!("Grade {grade}:");
                for (position, entry) in entries.iter().enumerate() {
                    println!("  {}. {} ({:+})", position + 1, entry.class_id, entry.total);
                }
            }
        }
        Commands::Roster => {
            let roster = db::fetch_roster(&pool).await?;
            match roster.updated_at {
                Some(at) => println!("Roster (last updated {at}):"),
                None => println!("Roster (defaults, never configured):"),
            }
            for grade in roster.grades() {
                println!("- grade {grade}: {} classes", roster.count(grade));
            }
        }
        Commands::History { grade, class, limit } => {
            let records = db::fetch_records(&pool).await?;
            let scoped: Vec<_> = records
                .iter()
                .filter(|record| grade.map_or(true, |g| record.grade == g))
                .filter(|record| {
                    class.as_deref().map_or(true, |c| record.class_id == c)
                })
                .collect();
            if scoped.is_empty() {
                println!("No score records.");
                return Ok(());
            }
            for record in scoped.iter().take(limit) {
                let note = record
                    .note
                    .as_deref()
                    .map(|n| format!(" ({n})"))
                    .unwrap_or_default();
                let stale = if record.week_is_consistent() {
                    ""
                } else {
                    " [week label out of sync]"
                };
                println!(
                    "- {} {} {} {} {:+} by {}{note}{stale}",
                    record.id,
                    record.date,
                    record.score_type,
                    record.class_id,
                    record.score,
                    record.rater_uid
                );
            }
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Imported {inserted} records from {}.", csv.display());
        }
        Commands::Report { week: week_arg, out } => {
            let target_week =
                week_arg.unwrap_or_else(|| week::week_label(Utc::now().date_naive()));
            let roster = db::fetch_roster(&pool).await?;
            let records = db::fetch_records(&pool).await?;
            let report = report::build_report(&target_week, &records, &roster)?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn resolve_date(arg: Option<&str>) -> Result<NaiveDate, errors::ScoreboardError> {
    match arg {
        Some(raw) => week::parse_date(raw),
        None => Ok(Utc::now().date_naive()),
    }
}

fn parse_grade_counts(args: &[String]) -> anyhow::Result<BTreeMap<u32, u32>> {
    let mut counts = BTreeMap::new();
    for arg in args {
        let (grade, count) = arg
            .split_once('=')
            .with_context(|| format!("expected GRADE=COUNT, got {arg:?}"))?;
        let grade: u32 = grade
            .trim()
            .parse()
            .with_context(|| format!("bad grade in {arg:?}"))?;
        let count: u32 = count
            .trim()
            .parse()
            .with_context(|| format!("bad class count in {arg:?}"))?;
        counts.insert(grade, count);
    }
    Ok(counts)
}
