//! Error types for Elidune Desk

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Stable numeric codes shown next to console error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    StorageFailure = 3,
    NoSuchMember = 4,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    MaxBorrowsReached = 11,
    MemberSuspended = 12,
    NoSuchSpecimen = 13,
    NoSuchLoan = 14,
    NoSuchReservation = 15,
    ItemAlreadyExists = 16,
    SpecimenAlreadyExists = 17,
    BadValue = 18,
    UserIdentificationAlreadyExists = 19,
    InvalidTransition = 20,
    ItemAlreadyAvailable = 21,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Book with ISBN {0} not found")]
    BookNotFound(String),

    #[error("Specimen {barcode} not found for book {isbn}")]
    SpecimenNotFound { isbn: String, barcode: String },

    #[error("Member {0} not found")]
    MemberNotFound(String),

    #[error("Loan {0} not found")]
    LoanNotFound(String),

    #[error("Reservation {0} not found")]
    ReservationNotFound(String),

    #[error("A book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error("Barcode {0} is already used in the catalog")]
    DuplicateBarcode(String),

    #[error("A member with email {0} already exists")]
    DuplicateEmail(String),

    #[error("Member {matricule} already has a reservation in progress for {isbn}")]
    DuplicateReservation { matricule: String, isbn: String },

    #[error("Member {matricule} reached the loan limit ({limit}) or is inactive")]
    LoanLimitReached { matricule: String, limit: usize },

    #[error("Member {matricule} is suspended until {until}")]
    MemberSuspended { matricule: String, until: DateTime<Utc> },

    #[error("No available specimen for book {0}")]
    CopyUnavailable(String),

    #[error("Book {0} has an available specimen, no reservation needed")]
    BookAlreadyAvailable(String),

    #[error("Cannot {action} a reservation that is {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BookNotFound(_) => ErrorCode::NoSuchItem,
            AppError::SpecimenNotFound { .. } => ErrorCode::NoSuchSpecimen,
            AppError::MemberNotFound(_) => ErrorCode::NoSuchMember,
            AppError::LoanNotFound(_) => ErrorCode::NoSuchLoan,
            AppError::ReservationNotFound(_) => ErrorCode::NoSuchReservation,
            AppError::DuplicateIsbn(_) => ErrorCode::ItemAlreadyExists,
            AppError::DuplicateBarcode(_) => ErrorCode::SpecimenAlreadyExists,
            AppError::DuplicateEmail(_) => ErrorCode::UserIdentificationAlreadyExists,
            AppError::DuplicateReservation { .. } => ErrorCode::Duplicate,
            AppError::LoanLimitReached { .. } => ErrorCode::MaxBorrowsReached,
            AppError::MemberSuspended { .. } => ErrorCode::MemberSuspended,
            AppError::CopyUnavailable(_) => ErrorCode::ItemNotAvailable,
            AppError::BookAlreadyAvailable(_) => ErrorCode::ItemAlreadyAvailable,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Persistence(_) => ErrorCode::StorageFailure,
            AppError::Config(_) | AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Persistence(format!("JSON encoding failed: {}", e))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        if messages.is_empty() {
            messages.push(errors.to_string());
        }
        AppError::Validation(messages.join(", "))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
