//! Data models for Elidune Desk

pub mod book;
pub mod datetime;
pub mod enums;
pub mod loan;
pub mod member;
pub mod reservation;
pub mod specimen;

// Re-export commonly used types
pub use book::{Book, BookUpdate, NewBook};
pub use enums::{
    BookCategory, BookStatus, LoanStatus, MemberCategory, ReservationStatus, SpecimenStatus,
};
pub use loan::Loan;
pub use member::{Member, MemberUpdate, NewMember};
pub use reservation::{Notification, Reservation};
pub use specimen::{NewSpecimen, Specimen};
