//! Reservation queue service

use std::sync::{Arc, OnceLock, Weak};

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    ids::{generate_unique_id, RESERVATION_PREFIX},
    models::{Notification, Reservation, ReservationStatus},
    repository::Repository,
    services::loans::LoansService,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    clock: SharedClock,
    /// Set once by `Services::new`; weak so the two services do not keep each other alive
    circulation: Arc<OnceLock<Weak<LoansService>>>,
}

impl ReservationsService {
    pub fn new(repository: Repository, clock: SharedClock) -> Self {
        Self {
            repository,
            clock,
            circulation: Arc::new(OnceLock::new()),
        }
    }

    /// Give the queue a way to turn confirmations into loans.
    /// Returns false if circulation was already attached.
    pub fn attach_circulation(&self, loans: &Arc<LoansService>) -> bool {
        self.circulation.set(Arc::downgrade(loans)).is_ok()
    }

    pub fn has_circulation(&self) -> bool {
        self.circulation().is_some()
    }

    fn circulation(&self) -> Option<Arc<LoansService>> {
        self.circulation.get().and_then(Weak::upgrade)
    }

    /// Queue `matricule` for `isbn`. Only allowed while no specimen is available.
    pub fn reserve(&self, matricule: &str, isbn: &str) -> AppResult<Reservation> {
        let member = self.repository.members.get(matricule)?;
        let book = self.repository.books.get(isbn)?;
        if book.is_available() {
            return Err(AppError::BookAlreadyAvailable(book.isbn));
        }

        let now = self.clock.now();
        let reservation = self.repository.reservations.modify(|r| {
            if r.has_open(&member.matricule, &book.isbn) {
                return Err(AppError::DuplicateReservation {
                    matricule: member.matricule.clone(),
                    isbn: book.isbn.clone(),
                });
            }
            let id = generate_unique_id(RESERVATION_PREFIX, |id| r.reservations.contains_key(id));
            let reservation = Reservation::new(id, &member.matricule, &book.isbn, now);
            r.reservations.insert(reservation.id.clone(), reservation.clone());
            r.queue_mut(&book.isbn).push(reservation.id.clone());
            Ok(reservation)
        })?;

        tracing::info!(
            actor = %member.matricule,
            action = "reserve",
            target = %book.isbn,
            reservation = %reservation.id,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Notify the first Pending reservation for `isbn` if a specimen is on the shelf.
    ///
    /// Non-pending ids are dropped from the queue on the way. Returns the id of the
    /// reservation that was notified, if any.
    pub fn process_queue(&self, isbn: &str) -> Option<String> {
        let available = self
            .repository
            .books
            .get(isbn)
            .map(|b| b.is_available())
            .unwrap_or(false);
        if !available {
            return None;
        }

        let result = self.repository.reservations.modify(|r| {
            r.retain_pending(isbn);
            let head = r
                .queues
                .get(&crate::repository::books::isbn_key(isbn))
                .and_then(|queue| queue.first().cloned());
            match head.and_then(|id| r.reservations.get_mut(&id)) {
                Some(reservation) => {
                    reservation.notify()?;
                    Ok(Some(reservation.clone()))
                }
                None => Ok(None),
            }
        });

        let reservation = match result {
            Ok(Some(reservation)) => reservation,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(target_isbn = %isbn, error = %e, "Queue processing failed");
                return None;
            }
        };

        let notification = Notification::for_reservation(&reservation, self.clock.now());
        if let Err(e) = self.repository.notifications.append(&notification) {
            tracing::error!(error = %e, "Failed to append notification");
            self.repository.warnings.push(e);
        }
        tracing::info!(
            actor = "system",
            action = "notify",
            target = %reservation.matricule,
            isbn = %reservation.isbn,
            reservation = %reservation.id,
            "Reservation holder notified"
        );
        Some(reservation.id)
    }

    /// Turn a Notified reservation into a loan.
    ///
    /// Returns false if the reservation is unknown, not Notified, or the loan
    /// could not be made; the reservation is left as it was in those cases.
    pub fn confirm(&self, reservation_id: &str) -> bool {
        let reservation = match self.repository.reservations.get(reservation_id) {
            Ok(r) if r.status() == ReservationStatus::Notified => r,
            _ => return false,
        };

        match self.circulation() {
            Some(loans) => {
                if let Err(e) = loans.borrow(&reservation.matricule, &reservation.isbn, None) {
                    tracing::error!(
                        actor = %reservation.matricule,
                        action = "confirm",
                        target = %reservation.id,
                        error = %e,
                        "Reservation confirmation failed, loan refused"
                    );
                    return false;
                }
            }
            None => {
                tracing::warn!(
                    target_id = %reservation.id,
                    "No circulation attached, confirming without a loan"
                );
            }
        }

        let confirmed = self.repository.reservations.modify(|r| {
            let entry = r
                .reservations
                .get_mut(reservation_id)
                .ok_or_else(|| AppError::ReservationNotFound(reservation_id.to_string()))?;
            entry.confirm()?;
            r.dequeue(reservation_id);
            Ok(())
        });
        match confirmed {
            Ok(()) => {
                tracing::info!(
                    actor = %reservation.matricule,
                    action = "confirm",
                    target = %reservation.id,
                    isbn = %reservation.isbn,
                    "Reservation confirmed"
                );
                true
            }
            Err(e) => {
                tracing::error!(target_id = %reservation.id, error = %e, "Reservation confirmation failed");
                false
            }
        }
    }

    /// Cancel a reservation. Returns false if it does not exist.
    pub fn cancel(&self, reservation_id: &str) -> AppResult<bool> {
        let existing = match self.repository.reservations.get(reservation_id) {
            Ok(r) => r,
            Err(_) => return Ok(false),
        };
        if existing.status() == ReservationStatus::Cancelled {
            return Ok(true);
        }

        self.repository.reservations.modify(|r| {
            let entry = r
                .reservations
                .get_mut(reservation_id)
                .ok_or_else(|| AppError::ReservationNotFound(reservation_id.to_string()))?;
            entry.cancel()?;
            r.dequeue(reservation_id);
            Ok(())
        })?;
        tracing::info!(
            actor = %existing.matricule,
            action = "cancel",
            target = %existing.id,
            isbn = %existing.isbn,
            "Reservation cancelled"
        );
        Ok(true)
    }

    pub fn get(&self, reservation_id: &str) -> AppResult<Reservation> {
        self.repository.reservations.get(reservation_id)
    }

    pub fn list_by_member(&self, matricule: &str) -> Vec<Reservation> {
        self.repository.reservations.filter(|r| r.matricule == matricule)
    }

    pub fn list_all(&self) -> Vec<Reservation> {
        self.repository.reservations.filter(|_| true)
    }

    /// Pending reservations waiting for `isbn`, first in line first
    pub fn list_queue_for(&self, isbn: &str) -> Vec<Reservation> {
        self.repository.reservations.pending_queue(isbn)
    }

    /// Lines of the notifications log, oldest first
    pub fn notifications(&self) -> AppResult<Vec<String>> {
        self.repository.notifications.read_all()
    }

    pub fn reload(&self) {
        self.repository.reservations.reload()
    }
}
