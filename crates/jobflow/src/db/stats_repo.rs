//! Dashboard statistics: counts composed from [`JobFilter`] and [`UserFilter`].

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::job_repo::{self, JobFilter};
use super::user_repo::{self, UserFilter};
use super::{parse_column, Database, DatabaseError};
use crate::model::{JobStatus, Role, UserId};

/// Start and end (exclusive) of the UTC calendar day containing `now`.
pub fn day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

/// Jobs that count as active writer work for overdue checks.
pub const ACTIVE_WRITER_STATUSES: [JobStatus; 2] = [JobStatus::Allocated, JobStatus::InProgress];

/// Headline numbers for the allocator dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorStats {
    pub pending_count: u64,
    pub allocated_today: u64,
    pub active_writers: u64,
    pub overdue_count: u64,
}

pub fn allocator_stats(db: &Database, now: DateTime<Utc>) -> Result<AllocatorStats, DatabaseError> {
    let (today, tomorrow) = day_bounds(now);
    db.with_conn(|conn| {
        Ok(AllocatorStats {
            pending_count: job_repo::count(
                conn,
                &JobFilter::new().status(JobStatus::PendingAllocation),
            )?,
            allocated_today: job_repo::count(
                conn,
                &JobFilter::new().allocated_between(today, tomorrow),
            )?,
            active_writers: user_repo::count(conn, &UserFilter::eligible(Role::Writer))?,
            overdue_count: job_repo::count(
                conn,
                &JobFilter::new()
                    .statuses(ACTIVE_WRITER_STATUSES)
                    .strict_deadline_before(now),
            )?,
        })
    })
}

/// Counters shown to a writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterStats {
    /// Allocated or in progress.
    pub assigned_count: u64,
    pub in_progress: u64,
    /// Submitted or completed.
    pub completed: u64,
}

pub fn writer_stats(db: &Database, writer: &UserId) -> Result<WriterStats, DatabaseError> {
    db.with_conn(|conn| {
        let mine = JobFilter::new().allocated_to(writer);
        Ok(WriterStats {
            assigned_count: job_repo::count(conn, &mine.clone().statuses(ACTIVE_WRITER_STATUSES))?,
            in_progress: job_repo::count(conn, &mine.clone().status(JobStatus::InProgress))?,
            completed: job_repo::count(
                conn,
                &mine.statuses([JobStatus::Submitted, JobStatus::Completed]),
            )?,
        })
    })
}

/// Counters shown to a process user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStats {
    pub in_queue: u64,
    pub completed_today: u64,
}

pub fn process_stats(
    db: &Database,
    process_user: &UserId,
    now: DateTime<Utc>,
) -> Result<ProcessStats, DatabaseError> {
    let (today, tomorrow) = day_bounds(now);
    db.with_conn(|conn| {
        let mine = JobFilter::new().process_user(process_user);
        Ok(ProcessStats {
            in_queue: job_repo::count(conn, &mine.clone().status(JobStatus::ProcessingQueue))?,
            completed_today: job_repo::count(
                conn,
                &mine
                    .status(JobStatus::Completed)
                    .updated_between(today, tomorrow),
            )?,
        })
    })
}

/// Number of jobs in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: u64,
}

/// Job counts per status, in lifecycle order. Statuses with no jobs are omitted.
pub fn status_breakdown(db: &Database) -> Result<Vec<StatusCount>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")?;
        let raw: Vec<(String, u64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = raw
            .into_iter()
            .map(|(status, count)| {
                Ok(StatusCount {
                    status: parse_column("jobs", "status", &status)?,
                    count,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        counts.sort_by_key(|c| JobStatus::ALL.iter().position(|s| *s == c.status));
        Ok(counts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 17, 45, 12).unwrap();
        let (start, end) = day_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_database_stats() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
        let stats = allocator_stats(&db, now).unwrap();
        assert_eq!(
            stats,
            AllocatorStats {
                pending_count: 0,
                allocated_today: 0,
                active_writers: 0,
                overdue_count: 0,
            }
        );
        assert!(status_breakdown(&db).unwrap().is_empty());
    }

    #[test]
    fn test_status_breakdown_in_lifecycle_order() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(
                "INSERT INTO users (id, email, first_name, last_name, whatsapp_no, role,
                 approval_status, is_active, created_at, updated_at)
                 VALUES ('m', 'm@example.com', 'M', 'K', '1', 'marketing', 'approved', 1, 't', 't');
                 INSERT INTO jobs (job_id, instructions, created_by, status, created_at, updated_at)
                 VALUES ('A', 'x', 'm', 'completed', 't', 't'),
                        ('B', 'x', 'm', 'draft', 't', 't'),
                        ('C', 'x', 'm', 'draft', 't', 't');",
            )?;
            Ok(())
        })
        .unwrap();

        let counts = status_breakdown(&db).unwrap();
        assert_eq!(
            counts,
            vec![
                StatusCount {
                    status: JobStatus::Draft,
                    count: 2
                },
                StatusCount {
                    status: JobStatus::Completed,
                    count: 1
                },
            ]
        );
    }
}
