//! Cron schedule compilation and next-occurrence evaluation.
//!
//! Expressions use the six-field format with a leading seconds field:
//! `second minute hour day_of_month month day_of_week`.
//!
//! Examples:
//! - `"*/10 * * * * *"` - every 10 seconds
//! - `"0 */5 * * * *"` - every 5 minutes
//! - `"0 0 9 * * MON-FRI"` - 9 AM on weekdays
//!
//! All evaluation happens in UTC; daylight-saving transitions cannot produce
//! ambiguous or skipped occurrences.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::core::error::ScheduleError;

/// A compiled cron expression. Immutable once parsed.
#[derive(Debug, Clone)]
pub struct CronSpec {
    schedule: Schedule,
    expression: String,
}

impl CronSpec {
    /// Compile a six-field cron expression.
    ///
    /// Fails on empty input, on any field count other than six (the evaluator
    /// would otherwise also accept a seventh year field), and on any
    /// expression the evaluator rejects.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] describing what was wrong with the input.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::Empty);
        }
        let found = trimmed.split_whitespace().count();
        if found != 6 {
            return Err(ScheduleError::FieldCount { found });
        }
        let schedule = Schedule::from_str(trimmed)?;
        Ok(Self {
            schedule,
            expression: trimmed.to_string(),
        })
    }

    /// The original expression string, for diagnostics.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next occurrence strictly after `from`, or `None` if the schedule has
    /// no future occurrence.
    pub fn next_occurrence(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&from).find(|t| *t > from)
    }

    /// Advance from `previous` until the occurrence lies in the future.
    ///
    /// When the caller fell behind (a slow job body, a coarse tick), every
    /// elapsed occurrence is skipped in one step; a missed occurrence is never
    /// fired late.
    pub fn next_after_catchup(
        &self,
        previous: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let mut next = previous;
        loop {
            next = self.next_occurrence(next)?;
            if next > now {
                return Some(next);
            }
        }
    }
}

impl fmt::Display for CronSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}
