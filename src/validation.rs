//! Field validators shared by the `validator` derives on models

use std::borrow::Cow;

use chrono::{Datelike, DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use crate::error::{AppError, AppResult};

/// Barcodes printed on specimens are exactly this long
pub const BARCODE_LENGTH: usize = 5;

static PHONE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8,12}$").unwrap());

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Strip separators from an ISBN ("978-2-07-040850-4" -> "9782070408504")
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// ISBN-10 or ISBN-13 with a valid check digit
pub fn isbn(value: &str) -> Result<(), ValidationError> {
    let digits = normalize_isbn(value);
    let valid = match digits.len() {
        10 => {
            let mut total = 0u32;
            for (i, c) in digits.chars().enumerate() {
                let v = match c {
                    'X' | 'x' if i == 9 => 10,
                    c => match c.to_digit(10) {
                        Some(d) => d,
                        None => return Err(error("isbn", "ISBN contains invalid characters")),
                    },
                };
                total += (10 - i as u32) * v;
            }
            total % 11 == 0
        }
        13 => {
            let mut total = 0u32;
            for (i, c) in digits.chars().enumerate() {
                let Some(d) = c.to_digit(10) else {
                    return Err(error("isbn", "ISBN contains invalid characters"));
                };
                total += if i % 2 == 0 { d } else { 3 * d };
            }
            total % 10 == 0
        }
        _ => return Err(error("isbn", "ISBN must have 10 or 13 digits")),
    };

    if valid {
        Ok(())
    } else {
        Err(error("isbn", "ISBN checksum mismatch"))
    }
}

pub fn barcode(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("barcode", "Barcode is required"));
    }
    if value.chars().count() != BARCODE_LENGTH {
        return Err(error("barcode", "Barcode must be exactly 5 characters"));
    }
    Ok(())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// 8 to 12 digits once spaces and hyphens are removed
pub fn phone(value: &str) -> Result<(), ValidationError> {
    let digits: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    if PHONE_DIGITS.is_match(&digits) {
        Ok(())
    } else {
        Err(error("phone", "Phone number must contain 8 to 12 digits"))
    }
}

/// Publication years run from year 1 up to the current year
pub fn publication_year(year: i32, now: DateTime<Utc>) -> AppResult<()> {
    if year < 1 || year > now.year() {
        return Err(AppError::Validation(format!(
            "publication_year: {} is not between 1 and {}",
            year,
            now.year()
        )));
    }
    Ok(())
}
