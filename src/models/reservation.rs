//! Reservation model, its state machine, and queue notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use uuid::Uuid;

use super::datetime::{format_timestamp, IsoSeconds};
use super::enums::ReservationStatus;
use crate::error::{AppError, AppResult};

/// A member's place in a book's waiting queue.
///
/// `Pending -> Notified -> Confirmed`, and `Pending | Notified -> Cancelled`.
/// Cancelled and Confirmed are terminal. Reservations are never deleted.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub matricule: String,
    pub isbn: String,
    #[serde_as(as = "IsoSeconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    status: ReservationStatus,
}

impl Reservation {
    pub fn new(id: String, matricule: &str, isbn: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            matricule: matricule.to_string(),
            isbn: isbn.to_string(),
            created_at: now,
            status: ReservationStatus::Pending,
        }
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Pending or Notified
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            ReservationStatus::Pending | ReservationStatus::Notified
        )
    }

    pub fn notify(&mut self) -> AppResult<()> {
        self.transition(ReservationStatus::Pending, ReservationStatus::Notified, "notify")
    }

    pub fn confirm(&mut self) -> AppResult<()> {
        self.transition(ReservationStatus::Notified, ReservationStatus::Confirmed, "confirm")
    }

    /// Idempotent on an already cancelled reservation.
    pub fn cancel(&mut self) -> AppResult<()> {
        match self.status {
            ReservationStatus::Cancelled => Ok(()),
            ReservationStatus::Pending | ReservationStatus::Notified => {
                self.status = ReservationStatus::Cancelled;
                Ok(())
            }
            ReservationStatus::Confirmed => Err(self.invalid("cancel")),
        }
    }

    fn transition(
        &mut self,
        from: ReservationStatus,
        to: ReservationStatus,
        action: &str,
    ) -> AppResult<()> {
        if self.status != from {
            return Err(self.invalid(action));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, action: &str) -> AppError {
        AppError::InvalidTransition {
            from: self.status.to_string(),
            action: action.to_string(),
        }
    }
}

/// Emitted when the head of a queue is told its book is back
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub matricule: String,
    pub isbn: String,
    pub reservation_id: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn for_reservation(reservation: &Reservation, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            matricule: reservation.matricule.clone(),
            isbn: reservation.isbn.clone(),
            reservation_id: reservation.id.clone(),
            at,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] Member {}: book {} is available (reservation {}, notification {})",
            format_timestamp(&self.at),
            self.matricule,
            self.isbn,
            self.reservation_id,
            self.id
        )
    }
}
