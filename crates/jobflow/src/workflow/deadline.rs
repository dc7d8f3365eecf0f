//! Soft/hard deadline rules.
//!
//! The hard (strict) deadline is the soft deadline plus a fixed grace
//! period. It is derived once, at completion time, and never recomputed.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::error::WorkflowError;

/// Grace period between the soft and the hard deadline.
pub const STRICT_GRACE_HOURS: i64 = 24;

/// Minimum distance between "now" and a newly entered soft deadline.
pub const MIN_LEAD_MINUTES: i64 = 60;

/// Years the timestamp columns can hold as sortable four-digit RFC 3339 text.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub grace: Duration,
    pub min_lead: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            grace: Duration::hours(STRICT_GRACE_HOURS),
            min_lead: Duration::minutes(MIN_LEAD_MINUTES),
        }
    }
}

impl DeadlinePolicy {
    pub fn strict_deadline_for(
        &self,
        expected: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, WorkflowError> {
        expected
            .checked_add_signed(self.grace)
            .filter(|strict| STORABLE_YEARS.contains(&strict.year()))
            .ok_or_else(|| {
                WorkflowError::validation("expected_deadline", "is too far in the future")
            })
    }

    /// Checks a soft deadline entered on the completion form.
    pub fn validate_expected_deadline(
        &self,
        expected: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if expected <= now {
            return Err(WorkflowError::validation(
                "expected_deadline",
                "must be in the future",
            ));
        }
        if expected < now + self.min_lead {
            return Err(WorkflowError::validation(
                "expected_deadline",
                format!(
                    "must be at least {} minutes from now",
                    self.min_lead.num_minutes()
                ),
            ));
        }
        self.strict_deadline_for(expected)?;
        Ok(())
    }
}
