//! Loan model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::datetime::IsoSeconds;
use super::enums::LoanStatus;
use crate::error::{AppError, AppResult};

/// One borrowing of one specimen. Loans are never deleted.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub matricule: String,
    pub isbn: String,
    pub barcode: String,
    #[serde_as(as = "IsoSeconds")]
    pub borrowed_at: DateTime<Utc>,
    #[serde_as(as = "IsoSeconds")]
    pub due_at: DateTime<Utc>,
    #[serde_as(as = "Option<IsoSeconds>")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub renewals: u32,
}

impl Loan {
    pub fn new(
        id: String,
        matricule: &str,
        isbn: &str,
        barcode: &str,
        now: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            matricule: matricule.to_string(),
            isbn: isbn.to_string(),
            barcode: barcode.to_string(),
            borrowed_at: now,
            due_at,
            returned_at: None,
            renewals: 0,
        }
    }

    /// `from` plus a positive number of days, checked against the calendar range
    pub fn due_date(from: DateTime<Utc>, days: i64) -> AppResult<DateTime<Utc>> {
        if days <= 0 {
            return Err(AppError::Validation(format!("days: must be positive, got {}", days)));
        }
        Duration::try_days(days)
            .and_then(|span| from.checked_add_signed(span))
            .ok_or_else(|| AppError::Validation(format!("days: {} is out of range", days)))
    }

    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// A returned loan stays Overdue when it came back late.
    pub fn status(&self, now: DateTime<Utc>) -> LoanStatus {
        match self.returned_at {
            Some(returned) if returned > self.due_at => LoanStatus::Overdue,
            Some(_) => LoanStatus::Returned,
            None if now > self.due_at => LoanStatus::Overdue,
            None => LoanStatus::Borrowed,
        }
    }

    /// Still out and past due
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_returned() && now > self.due_at
    }

    pub fn can_renew(&self, now: DateTime<Utc>, max_renewals: u32) -> bool {
        !self.is_returned() && !self.is_overdue(now) && self.renewals < max_renewals
    }

    /// Push the due date back by `days`. Returns false when not eligible;
    /// an out-of-range extension fails and leaves the loan untouched.
    pub fn renew(&mut self, days: i64, now: DateTime<Utc>, max_renewals: u32) -> AppResult<bool> {
        if !self.can_renew(now, max_renewals) {
            return Ok(false);
        }
        self.due_at = Self::due_date(self.due_at, days)?;
        self.renewals += 1;
        Ok(true)
    }

    /// Stamp the return time. Returns false if the loan was already closed.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_returned() {
            return false;
        }
        self.returned_at = Some(at);
        true
    }

    /// Whole days between the due date and `at` (negative when early)
    pub fn days_late(&self, at: DateTime<Utc>) -> i64 {
        (at - self.due_at).num_days()
    }
}
