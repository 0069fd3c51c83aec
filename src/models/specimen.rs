//! Specimen (physical copy) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use super::datetime::IsoSeconds;
use super::enums::SpecimenStatus;
use crate::error::AppResult;

pub const DEFAULT_CONDITION: &str = "good";
pub const DEFAULT_LOCATION: &str = "stock";

/// Physical copy of a book. Owned by exactly one [`super::Book`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Specimen {
    pub id: String,
    #[validate(custom(function = "crate::validation::barcode"))]
    pub barcode: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub condition: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub location: String,
    #[serde(default)]
    pub status: SpecimenStatus,
    #[serde_as(as = "IsoSeconds")]
    pub acquired_at: DateTime<Utc>,
}

/// Create specimen request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSpecimen {
    /// Barcode, unique across the whole catalog
    #[validate(custom(function = "crate::validation::barcode"))]
    pub barcode: String,
    pub condition: Option<String>,
    pub location: Option<String>,
}

impl NewSpecimen {
    pub fn with_barcode(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            condition: None,
            location: None,
        }
    }
}

impl Specimen {
    pub fn new(id: String, request: NewSpecimen, now: DateTime<Utc>) -> AppResult<Self> {
        request.validate()?;
        let specimen = Self {
            id,
            barcode: request.barcode.trim().to_string(),
            condition: request
                .condition
                .unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
            location: request
                .location
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            status: SpecimenStatus::Available,
            acquired_at: now,
        };
        specimen.validate()?;
        Ok(specimen)
    }

    pub fn is_available(&self) -> bool {
        self.status == SpecimenStatus::Available
    }

    /// Barcode comparison used for catalog-wide uniqueness
    pub fn barcode_matches(&self, barcode: &str) -> bool {
        self.barcode.trim().eq_ignore_ascii_case(barcode.trim())
    }
}
