//! Command line definition for the `jobflow` operator tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobflow::{ApprovalStatus, JobStatus};

/// Inspect and seed a jobflow database.
#[derive(Debug, Parser)]
#[command(name = "jobflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON config file.
    #[arg(long, global = true, env = "JOBFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file. Overrides the config file.
    #[arg(long, global = true, env = "JOBFLOW_DATABASE")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database if needed and apply pending migrations.
    Migrate,

    /// Create an approved superadmin account.
    BootstrapSuperadmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, default_value = "")]
        whatsapp_no: String,
    },

    /// Print job counts per status and the allocator statistics.
    Stats,

    /// List jobs, newest first.
    Jobs {
        /// Only jobs in this status (e.g. `pending_allocation`).
        #[arg(long)]
        status: Option<JobStatus>,

        #[arg(long, default_value_t = 50)]
        limit: u64,
    },

    /// List users, newest first.
    Users {
        /// Only users with this approval status (pending, approved, rejected).
        #[arg(long)]
        approval: Option<ApprovalStatus>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "jobflow",
            "--database",
            "/tmp/jobflow.db",
            "--config",
            "jobflow.json",
            "migrate",
        ]);
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/jobflow.db")));
        assert_eq!(cli.config, Some(PathBuf::from("jobflow.json")));
        assert!(matches!(cli.command, Command::Migrate));
    }

    #[test]
    fn cli_parses_bootstrap() {
        let cli = Cli::parse_from([
            "jobflow",
            "bootstrap-superadmin",
            "--email",
            "root@example.com",
            "--first-name",
            "Ro",
            "--last-name",
            "Ot",
        ]);
        match cli.command {
            Command::BootstrapSuperadmin {
                email,
                first_name,
                last_name,
                whatsapp_no,
            } => {
                assert_eq!(email, "root@example.com");
                assert_eq!(first_name, "Ro");
                assert_eq!(last_name, "Ot");
                assert!(whatsapp_no.is_empty());
            }
            _ => panic!("expected BootstrapSuperadmin command"),
        }
    }

    #[test]
    fn cli_parses_job_status_filter() {
        let cli = Cli::parse_from(["jobflow", "jobs", "--status", "pending_allocation"]);
        match cli.command {
            Command::Jobs { status, limit } => {
                assert_eq!(status, Some(JobStatus::PendingAllocation));
                assert_eq!(limit, 50);
            }
            _ => panic!("expected Jobs command"),
        }
        assert!(Cli::try_parse_from(["jobflow", "jobs", "--status", "lost"]).is_err());
    }

    #[test]
    fn cli_parses_user_filter() {
        let cli = Cli::parse_from(["jobflow", "users", "--approval", "pending"]);
        assert!(matches!(
            cli.command,
            Command::Users {
                approval: Some(ApprovalStatus::Pending)
            }
        ));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
