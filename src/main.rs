use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod aggregate;
mod catalog;
mod db;
mod export;
mod models;
mod report;

use catalog::{find_activity, Activity, OpenDays};
use db::StoreError;
use models::EventRecord;

#[derive(Parser)]
#[command(name = "checkin-report")]
#[command(about = "Check-in and redemption reporting for the Giftival event", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the event store schema
    InitDb,
    /// Load realistic fixture events
    Seed,
    /// List the activity catalog
    Activities,
    /// Daily breakdown report for one activity
    Report {
        #[arg(long)]
        activity: String,
        /// Restrict to a single day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Cross-activity rollup report
    Overview {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "overview.md")]
        out: PathBuf,
    },
    /// Chart-ready JSON (category series and tier slices) on stdout
    Chart {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Raw event dump as CSV; omit --activity for all activities
    Export {
        #[arg(long)]
        activity: Option<String>,
        #[arg(long, default_value = "export.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to the event store Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let activities = catalog::catalog();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} new events).");
        }
        Commands::Activities => {
            for activity in &activities {
                let categories: Vec<&str> =
                    activity.supported.iter().map(|c| c.as_str()).collect();
                let days = match &activity.open_days {
                    OpenDays::All => "every day".to_string(),
                    OpenDays::OnlyDaysOfMonth(days) => format!("days {days:?} only"),
                };
                println!(
                    "- {} ({}): quota {}, {} to {}, {}, accepts [{}]",
                    activity.name,
                    activity.id,
                    activity.total_quota,
                    activity.start_date,
                    activity.end_date,
                    days,
                    categories.join(", ")
                );
            }
        }
        Commands::Report {
            activity,
            date,
            out,
        } => {
            let current = find_activity(&activities, &activity);
            let events = fetch_window(&pool, current, &activities).await;
            let buckets = aggregate::daily_breakdown(current, &events, date);

            let rendered = match current {
                Some(a) => report::build_activity_report(a, &buckets),
                None => {
                    warn!(id = %activity, "unknown activity id, rendering empty breakdown");
                    let mut s = String::new();
                    let _ = writeln!(s, "# Unknown Activity `{activity}`");
                    let _ = writeln!(s, "No catalog entry; all counts are zero.");
                    let _ = writeln!(s);
                    s.push_str(&report::tier_pivot(&buckets));
                    s
                }
            };

            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Overview { date, out } => {
            let events = fetch_window(&pool, None, &activities).await;
            let buckets = aggregate::overview_breakdown(&activities, &events, date);
            let rendered = report::build_overview_report(&activities, &buckets);
            std::fs::write(&out, rendered)?;
            println!("Overview written to {}.", out.display());
        }
        Commands::Chart { activity, date } => {
            let current = find_activity(&activities, &activity);
            let events = fetch_window(&pool, current, &activities).await;
            let buckets = aggregate::daily_breakdown(current, &events, date);

            let payload = serde_json::json!({
                "categorySeries": report::category_series(&buckets),
                "tierSlices": report::tier_slices(&buckets),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Export { activity, out } => {
            // Unresolved or missing id falls back to every activity.
            let db_id = activity
                .as_deref()
                .and_then(|id| find_activity(&activities, id))
                .map(|a| a.db_id);
            let events = db::fetch_export_rows(&pool, db_id)
                .await
                .context("event store unavailable, export aborted")?;
            let csv = export::write_csv(&events)?;
            std::fs::write(&out, csv)?;
            info!(rows = events.len(), path = %out.display(), "export complete");
            println!("Exported {} events to {}.", events.len(), out.display());
        }
    }

    Ok(())
}

/// Single bulk fetch for the reporting window. A store failure degrades to
/// an empty dataset with a user-visible message instead of aborting, so the
/// report still renders its zeroed, gap-free series.
async fn fetch_window(
    pool: &sqlx::PgPool,
    activity: Option<&Activity>,
    activities: &[Activity],
) -> Vec<EventRecord> {
    let (start, end) = match activity {
        Some(a) => (a.start_date, a.end_date),
        None => {
            let start = activities.iter().map(|a| a.start_date).min();
            let end = activities.iter().map(|a| a.end_date).max();
            match (start, end) {
                (Some(s), Some(e)) => (s, e),
                _ => catalog::default_window(),
            }
        }
    };

    let result: Result<Vec<EventRecord>, StoreError> =
        db::fetch_events(pool, activity.map(|a| a.db_id), start, end).await;

    match result {
        Ok(events) => events,
        Err(err) => {
            error!(error = %err, "event store fetch failed, continuing with empty data");
            println!("Event store unavailable; showing empty data.");
            Vec::new()
        }
    }
}
