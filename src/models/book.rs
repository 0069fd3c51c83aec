//! Book (catalog entry) model and related types.
//!
//! A book owns its specimens; its [`BookStatus`] is always derived from them, so
//! the availability invariant cannot drift from the copy list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use unicode_normalization::UnicodeNormalization;
use validator::Validate;

use super::datetime::IsoSeconds;
use super::enums::{BookCategory, BookStatus, SpecimenStatus};
use super::specimen::Specimen;
use crate::error::AppResult;
use crate::validation;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Book {
    pub id: String,
    #[validate(custom(function = "crate::validation::isbn"))]
    pub isbn: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub author: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub publisher: String,
    #[validate(range(min = 1))]
    pub publication_year: i32,
    #[serde(default)]
    pub category: BookCategory,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub borrow_count: u32,
    #[serde_as(as = "IsoSeconds")]
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    #[validate(nested)]
    specimens: Vec<Specimen>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    #[validate(custom(function = "crate::validation::isbn"))]
    pub isbn: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub author: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub publisher: String,
    pub publication_year: i32,
    #[serde(default)]
    pub category: BookCategory,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Update book request; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub category: Option<BookCategory>,
    pub keywords: Option<Vec<String>>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.publication_year.is_none()
            && self.category.is_none()
            && self.keywords.is_none()
    }
}

/// Lowercased NFKC form used for case-insensitive matching
pub fn fold_case(value: &str) -> String {
    value.nfkc().collect::<String>().to_lowercase()
}

impl Book {
    pub fn new(id: String, request: NewBook, now: DateTime<Utc>) -> AppResult<Self> {
        request.validate()?;
        validation::publication_year(request.publication_year, now)?;
        Ok(Self {
            id,
            isbn: request.isbn.trim().to_string(),
            title: request.title.trim().to_string(),
            author: request.author.trim().to_string(),
            publisher: request.publisher.trim().to_string(),
            publication_year: request.publication_year,
            category: request.category,
            keywords: clean_keywords(request.keywords),
            borrow_count: 0,
            added_at: now,
            specimens: Vec::new(),
        })
    }

    /// Apply a metadata update. Nothing changes unless the whole result is valid.
    pub fn apply_update(&mut self, update: BookUpdate, now: DateTime<Utc>) -> AppResult<()> {
        let mut candidate = self.clone();
        if let Some(title) = update.title {
            candidate.title = title.trim().to_string();
        }
        if let Some(author) = update.author {
            candidate.author = author.trim().to_string();
        }
        if let Some(publisher) = update.publisher {
            candidate.publisher = publisher.trim().to_string();
        }
        if let Some(year) = update.publication_year {
            validation::publication_year(year, now)?;
            candidate.publication_year = year;
        }
        if let Some(category) = update.category {
            candidate.category = category;
        }
        if let Some(keywords) = update.keywords {
            candidate.keywords = clean_keywords(keywords);
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn status(&self) -> BookStatus {
        if self.specimens.is_empty() {
            BookStatus::Unavailable
        } else if self.is_available() {
            BookStatus::Available
        } else {
            BookStatus::OnLoan
        }
    }

    pub fn specimens(&self) -> &[Specimen] {
        &self.specimens
    }

    pub fn specimen(&self, barcode: &str) -> Option<&Specimen> {
        self.specimens.iter().find(|s| s.barcode == barcode)
    }

    pub fn has_barcode(&self, barcode: &str) -> bool {
        self.specimens.iter().any(|s| s.barcode_matches(barcode))
    }

    pub fn available_count(&self) -> usize {
        self.specimens.iter().filter(|s| s.is_available()).count()
    }

    pub fn is_available(&self) -> bool {
        self.specimens.iter().any(Specimen::is_available)
    }

    pub fn add_specimen(&mut self, specimen: Specimen) {
        self.specimens.push(specimen);
    }

    /// Returns false when no specimen carries `barcode`
    pub fn remove_specimen(&mut self, barcode: &str) -> bool {
        match self.specimens.iter().position(|s| s.barcode == barcode) {
            Some(index) => {
                self.specimens.remove(index);
                true
            }
            None => false,
        }
    }

    /// Pick the specimen to lend: the named one if it is available, otherwise the
    /// first available one. Returns `None` when nothing suitable is on the shelf.
    pub fn select_available(&self, barcode: Option<&str>) -> Option<&Specimen> {
        match barcode {
            Some(code) => self.specimen(code).filter(|s| s.is_available()),
            None => self.specimens.iter().find(|s| s.is_available()),
        }
    }

    /// Set the status of one specimen. Returns false if the barcode is unknown.
    pub fn set_specimen_status(&mut self, barcode: &str, status: SpecimenStatus) -> bool {
        match self.specimens.iter_mut().find(|s| s.barcode == barcode) {
            Some(specimen) => {
                specimen.status = status;
                true
            }
            None => false,
        }
    }

    pub fn record_borrow(&mut self) {
        self.borrow_count += 1;
    }

    /// Case-insensitive substring search over title, author, publisher and keywords
    pub fn matches_text(&self, token: &str) -> bool {
        let token = fold_case(token);
        fold_case(&self.title).contains(&token)
            || fold_case(&self.author).contains(&token)
            || fold_case(&self.publisher).contains(&token)
            || self.keywords.iter().any(|k| fold_case(k).contains(&token))
    }
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}
