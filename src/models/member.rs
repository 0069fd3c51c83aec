//! Member model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use super::datetime::IsoSeconds;
use super::enums::MemberCategory;
use crate::error::{AppError, AppResult};

/// Reference to a specimen currently held by a member
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRef {
    pub isbn: String,
    pub barcode: String,
    #[serde_as(as = "IsoSeconds")]
    pub borrowed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Borrow,
    Return,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub isbn: String,
    pub barcode: String,
    #[serde_as(as = "IsoSeconds")]
    pub at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Member {
    pub matricule: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub last_name: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub first_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "crate::validation::phone"))]
    pub phone: String,
    #[serde_as(as = "IsoSeconds")]
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    category: MemberCategory,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    current_loans: Vec<LoanRef>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMember {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub last_name: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub first_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "crate::validation::phone"))]
    pub phone: String,
    #[serde(default)]
    pub category: MemberCategory,
}

/// Update member request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberUpdate {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Email comparison key; addresses are unique regardless of case
pub fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Member {
    pub fn new(matricule: String, request: NewMember, now: DateTime<Utc>) -> AppResult<Self> {
        request.validate()?;
        Ok(Self {
            matricule,
            last_name: request.last_name.trim().to_string(),
            first_name: request.first_name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            registered_at: now,
            category: request.category,
            active: true,
            current_loans: Vec::new(),
            history: Vec::new(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn category(&self) -> MemberCategory {
        self.category
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn loan_limit(&self) -> usize {
        self.category.loan_limit()
    }

    pub fn loan_count(&self) -> usize {
        self.current_loans.len()
    }

    pub fn current_loans(&self) -> &[LoanRef] {
        &self.current_loans
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Active and below the category loan limit
    pub fn can_borrow(&self) -> bool {
        self.active && self.current_loans.len() < self.loan_limit()
    }

    /// Returns true when the flag actually changed
    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = self.active != active;
        self.active = active;
        changed
    }

    /// Refuses a category whose limit is below the number of loans in hand.
    pub fn change_category(&mut self, category: MemberCategory) -> AppResult<()> {
        if self.current_loans.len() > category.loan_limit() {
            return Err(AppError::Validation(format!(
                "category: member {} holds {} loans, above the {} limit of {}",
                self.matricule,
                self.current_loans.len(),
                category,
                category.loan_limit()
            )));
        }
        self.category = category;
        Ok(())
    }

    pub fn record_loan(&mut self, isbn: &str, barcode: &str, at: DateTime<Utc>) {
        self.current_loans.push(LoanRef {
            isbn: isbn.to_string(),
            barcode: barcode.to_string(),
            borrowed_at: at,
        });
        self.history.push(HistoryEntry {
            action: HistoryAction::Borrow,
            isbn: isbn.to_string(),
            barcode: barcode.to_string(),
            at,
        });
    }

    /// Drops the matching current-loan reference and logs the return in history.
    /// Returns false when no reference matched.
    pub fn record_return(&mut self, isbn: &str, barcode: &str, at: DateTime<Utc>) -> bool {
        let position = self
            .current_loans
            .iter()
            .position(|l| l.isbn == isbn && l.barcode == barcode);
        if let Some(index) = position {
            self.current_loans.remove(index);
        }
        self.history.push(HistoryEntry {
            action: HistoryAction::Return,
            isbn: isbn.to_string(),
            barcode: barcode.to_string(),
            at,
        });
        position.is_some()
    }

    /// Apply personal-field changes; nothing changes unless the result validates
    pub fn apply_update(&mut self, update: MemberUpdate) -> AppResult<()> {
        let mut candidate = self.clone();
        if let Some(last_name) = update.last_name {
            candidate.last_name = last_name.trim().to_string();
        }
        if let Some(first_name) = update.first_name {
            candidate.first_name = first_name.trim().to_string();
        }
        if let Some(email) = update.email {
            candidate.email = email.trim().to_string();
        }
        if let Some(phone) = update.phone {
            candidate.phone = phone.trim().to_string();
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}
