//! Operator CLI for a jobflow database. Every command prints JSON on stdout.

mod cli;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use jobflow::db::job_repo::{self, JobFilter};
use jobflow::db::stats_repo;
use jobflow::db::user_repo::{self, UserFilter};
use jobflow::{Config, Database, NewUser, Role, Workflow};

use cli::{Cli, Command};

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => jobflow::load_config(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    jobflow::logging::init(&config.logging)?;

    let path = cli
        .database
        .clone()
        .or_else(|| config.database_path())
        .context("no database path configured and no home directory found")?;
    let db = Database::open(&path)
        .with_context(|| format!("opening database at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "database ready");

    match cli.command {
        Command::Migrate => print_json(&json!({
            "database": path.display().to_string(),
            "status": "ok",
        })),
        Command::BootstrapSuperadmin {
            email,
            first_name,
            last_name,
            whatsapp_no,
        } => {
            let user = Workflow::new(db).bootstrap_superadmin(NewUser {
                email,
                first_name,
                last_name,
                whatsapp_no,
                role: Role::Superadmin,
            })?;
            print_json(&user)
        }
        Command::Stats => {
            let statuses = stats_repo::status_breakdown(&db)?;
            let allocator = stats_repo::allocator_stats(&db, Utc::now())?;
            print_json(&json!({
                "statuses": statuses,
                "allocator": allocator,
            }))
        }
        Command::Jobs { status, limit } => {
            let mut filter = JobFilter::new().limit(limit);
            if let Some(status) = status {
                filter = filter.status(status);
            }
            let jobs = db.with_conn(|conn| job_repo::query(conn, &filter))?;
            print_json(&jobs)
        }
        Command::Users { approval } => {
            let filter = UserFilter {
                approval_status: approval,
                ..UserFilter::default()
            };
            let users = db.with_conn(|conn| user_repo::list(conn, &filter))?;
            print_json(&users)
        }
    }
}
