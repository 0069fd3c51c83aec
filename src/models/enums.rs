//! Shared domain enums

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BookStatus
// ---------------------------------------------------------------------------

/// Book availability, derived from its specimens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Unavailable,
    Available,
    OnLoan,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookStatus::Unavailable => "Unavailable",
            BookStatus::Available => "Available",
            BookStatus::OnLoan => "On loan",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "unavailable" => Ok(BookStatus::Unavailable),
            "available" => Ok(BookStatus::Available),
            "on_loan" | "onloan" => Ok(BookStatus::OnLoan),
            other => Err(format!("Invalid book status: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// SpecimenStatus
// ---------------------------------------------------------------------------

/// Status of one physical specimen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenStatus {
    #[default]
    Available,
    OnLoan,
    Reserved,
    Lost,
    Damaged,
    Unavailable,
}

impl SpecimenStatus {
    pub const ALL: [SpecimenStatus; 6] = [
        SpecimenStatus::Available,
        SpecimenStatus::OnLoan,
        SpecimenStatus::Reserved,
        SpecimenStatus::Lost,
        SpecimenStatus::Damaged,
        SpecimenStatus::Unavailable,
    ];
}

impl std::fmt::Display for SpecimenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SpecimenStatus::Available => "Available",
            SpecimenStatus::OnLoan => "On loan",
            SpecimenStatus::Reserved => "Reserved",
            SpecimenStatus::Lost => "Lost",
            SpecimenStatus::Damaged => "Damaged",
            SpecimenStatus::Unavailable => "Unavailable",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for SpecimenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "available" => Ok(SpecimenStatus::Available),
            "on_loan" | "onloan" => Ok(SpecimenStatus::OnLoan),
            "reserved" => Ok(SpecimenStatus::Reserved),
            "lost" => Ok(SpecimenStatus::Lost),
            "damaged" => Ok(SpecimenStatus::Damaged),
            "unavailable" => Ok(SpecimenStatus::Unavailable),
            other => Err(format!("Invalid specimen status: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// BookCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookCategory {
    Science,
    Literature,
    ComputerScience,
    Technology,
    ArtificialIntelligence,
    #[default]
    Other,
}

impl BookCategory {
    pub const ALL: [BookCategory; 6] = [
        BookCategory::Science,
        BookCategory::Literature,
        BookCategory::ComputerScience,
        BookCategory::Technology,
        BookCategory::ArtificialIntelligence,
        BookCategory::Other,
    ];
}

impl std::fmt::Display for BookCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookCategory::Science => "Science",
            BookCategory::Literature => "Literature",
            BookCategory::ComputerScience => "Computer science",
            BookCategory::Technology => "Technology",
            BookCategory::ArtificialIntelligence => "Artificial intelligence",
            BookCategory::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for BookCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "science" => Ok(BookCategory::Science),
            "literature" => Ok(BookCategory::Literature),
            "computer_science" => Ok(BookCategory::ComputerScience),
            "technology" => Ok(BookCategory::Technology),
            "artificial_intelligence" | "ai" => Ok(BookCategory::ArtificialIntelligence),
            "other" => Ok(BookCategory::Other),
            other => Err(format!("Invalid book category: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// MemberCategory
// ---------------------------------------------------------------------------

/// Member category; each carries a fixed loan limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    #[default]
    Student,
    Teacher,
    AdminStaff,
}

impl MemberCategory {
    pub const ALL: [MemberCategory; 3] = [
        MemberCategory::Student,
        MemberCategory::Teacher,
        MemberCategory::AdminStaff,
    ];

    pub fn loan_limit(&self) -> usize {
        match self {
            MemberCategory::Student => 3,
            MemberCategory::Teacher => 10,
            MemberCategory::AdminStaff => 5,
        }
    }
}

impl std::fmt::Display for MemberCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MemberCategory::Student => "Student",
            MemberCategory::Teacher => "Teacher",
            MemberCategory::AdminStaff => "Administrative staff",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for MemberCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "student" => Ok(MemberCategory::Student),
            "teacher" => Ok(MemberCategory::Teacher),
            "admin_staff" | "administrative_staff" | "staff" => Ok(MemberCategory::AdminStaff),
            other => Err(format!("Invalid member category: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Borrowed,
    Overdue,
    Returned,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Returned => "Returned",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ReservationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Notified,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Notified => "notified",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}
