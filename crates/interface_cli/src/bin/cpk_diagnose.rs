//! Driver Ledger - CPK Diagnostic Tool
//!
//! Computes the stats report for one user and prints it as pretty JSON. It
//! runs exactly the aggregation the stats call site runs.
//!
//! # Usage
//!
//! ```bash
//! # Last 30 days, daily buckets, memory store seeded from a file
//! CPK_SEED_FILE=./seed.json cpk-diagnose --user 0190...
//!
//! # January, weekly buckets, against PostgreSQL
//! CPK_STORE_BACKEND=postgres CPK_DATABASE_URL=postgres://... \
//!     cpk-diagnose --user 0190... --start 2024-01-01 --end 2024-01-31 --period semanal
//! ```
//!
//! # Environment Variables
//!
//! * `CPK_STORE_BACKEND` - `memory` or `postgres` (default: memory)
//! * `CPK_DATABASE_URL` - PostgreSQL connection string
//! * `CPK_FETCH_CAP` - documents per query (default: 500)
//! * `CPK_SEED_FILE` - JSON `{transactions, shifts}` for the memory backend
//! * `CPK_TIMEZONE`, `CPK_BUCKET_TIMEZONE` - IANA names (default: UTC)
//! * `CPK_COMPLETED_ONLY` - ignore pending and cancelled records (default: false)
//! * `CPK_LOG_LEVEL`, `CPK_LOG_FORMAT` - logging (default: info, pretty)

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::process::ExitCode;
use uuid::Uuid;

use core_kernel::UserId;
use domain_metrics::{HistoryQuery, Period, StatsQuery};
use interface_cli::{build_engine, config::AppConfig, error::CliError, init_tracing};

/// Prints the cost-per-kilometer report of one driver
#[derive(Parser, Debug)]
#[command(name = "cpk-diagnose", version, about)]
struct Args {
    /// User id
    #[arg(long)]
    user: Uuid,

    /// First day of the window (YYYY-MM-DD); defaults to the trailing window
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// History bucketing: diario, semanal, mensual or anual
    #[arg(long, default_value = "diario")]
    period: Period,

    /// Print only the N most recent history buckets
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            let code = e
                .downcast_ref::<CliError>()
                .map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::from_env()
        .map_err(CliError::from)
        .context("loading CPK_* configuration")?;
    init_tracing(&config);

    tracing::info!(
        user = %args.user,
        backend = ?config.store_backend,
        period = %args.period,
        "running cpk diagnosis"
    );

    let engine = build_engine(&config).await?;
    let user_id = UserId::from_uuid(args.user);

    let report = engine
        .stats(
            user_id,
            StatsQuery {
                start: args.start,
                end: args.end,
                period: args.period,
            },
        )
        .await
        .map_err(CliError::from)?;

    let mut output = serde_json::to_value(&report)?;
    if let Some(limit) = args.limit {
        let recent = engine
            .history(
                user_id,
                HistoryQuery {
                    start: args.start,
                    end: args.end,
                    period: args.period,
                    limit: Some(limit),
                },
            )
            .await
            .map_err(CliError::from)?;
        output["history"] = serde_json::to_value(&recent.history)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    if report.truncated {
        tracing::warn!("report computed from a capped fetch; totals are a floor");
    }
    Ok(())
}
