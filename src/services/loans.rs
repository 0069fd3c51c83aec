//! Circulation service: borrow, return, renew and penalties

use chrono::{DateTime, Duration, Utc};

use crate::{
    clock::SharedClock,
    config::CirculationConfig,
    error::{AppError, AppResult},
    ids::{generate_unique_id, LOAN_PREFIX},
    models::{Loan, LoanStatus, SpecimenStatus},
    repository::Repository,
    services::reservations::ReservationsService,
};

pub struct LoansService {
    repository: Repository,
    config: CirculationConfig,
    clock: SharedClock,
    reservations: ReservationsService,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        config: CirculationConfig,
        clock: SharedClock,
        reservations: ReservationsService,
    ) -> Self {
        Self {
            repository,
            config,
            clock,
            reservations,
        }
    }

    /// Borrow for the configured loan duration
    pub fn borrow(&self, matricule: &str, isbn: &str, barcode: Option<&str>) -> AppResult<Loan> {
        self.borrow_for(matricule, isbn, barcode, self.config.loan_duration_days)
    }

    /// Lend a specimen of `isbn` to `matricule`.
    ///
    /// Checks run in order: member exists, not suspended, below the loan limit,
    /// book exists, a suitable specimen is available.
    pub fn borrow_for(
        &self,
        matricule: &str,
        isbn: &str,
        barcode: Option<&str>,
        duration_days: i64,
    ) -> AppResult<Loan> {
        let now = self.clock.now();
        let due_at = Loan::due_date(now, duration_days)?;

        let member = self.repository.members.get(matricule)?;
        if let Some(until) = self.repository.loans.active_suspension(matricule, now) {
            return Err(AppError::MemberSuspended {
                matricule: member.matricule,
                until,
            });
        }
        if !member.can_borrow() {
            return Err(AppError::LoanLimitReached {
                matricule: member.matricule.clone(),
                limit: member.loan_limit(),
            });
        }

        let (book_isbn, barcode) = self.repository.books.update(isbn, |book| {
            let specimen = book
                .select_available(barcode)
                .ok_or_else(|| AppError::CopyUnavailable(book.isbn.clone()))?;
            let chosen = specimen.barcode.clone();
            book.set_specimen_status(&chosen, SpecimenStatus::OnLoan);
            book.record_borrow();
            Ok((book.isbn.clone(), chosen))
        })?;

        let loan = self.repository.loans.modify(now, |b| {
            let id = generate_unique_id(LOAN_PREFIX, |id| b.loans.contains_key(id));
            let loan = Loan::new(id, &member.matricule, &book_isbn, &barcode, now, due_at);
            b.loans.insert(loan.id.clone(), loan.clone());
            Ok(loan)
        })?;

        self.repository
            .members
            .update(&member.matricule, |m| {
                m.record_loan(&book_isbn, &barcode, now);
                Ok(())
            })?;

        tracing::info!(
            actor = %member.matricule,
            action = "borrow",
            target = %book_isbn,
            barcode = %barcode,
            loan = %loan.id,
            due_at = %loan.due_at,
            "Loan created"
        );
        Ok(loan)
    }

    /// Close a loan. A loan that is already returned comes back unchanged.
    ///
    /// A late return suspends the member for `suspension_factor` days per day late
    /// (at least one day late is counted), then the book's reservation queue runs.
    pub fn return_loan(&self, loan_id: &str) -> AppResult<Loan> {
        let existing = self.repository.loans.get(loan_id)?;
        if existing.is_returned() {
            return Ok(existing);
        }

        let now = self.clock.now();
        let factor = self.config.suspension_factor;
        let (loan, suspended_until) = self.repository.loans.modify(now, |b| {
            let loan = b
                .loans
                .get_mut(loan_id)
                .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))?;
            loan.mark_returned(now);
            let loan = loan.clone();
            let suspended_until = if loan.status(now) == LoanStatus::Overdue {
                let overdue_days = loan.days_late(now).max(1);
                Some(b.suspend(&loan.matricule, now + Duration::days(overdue_days * factor)))
            } else {
                None
            };
            Ok((loan, suspended_until))
        })?;

        let restored = self.repository.books.update(&loan.isbn, |book| {
            Ok(book.set_specimen_status(&loan.barcode, SpecimenStatus::Available))
        });
        match restored {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                isbn = %loan.isbn,
                barcode = %loan.barcode,
                "Returned specimen no longer in the catalog"
            ),
            Err(e) => tracing::warn!(isbn = %loan.isbn, error = %e, "Returned book no longer in the catalog"),
        }

        let recorded = self.repository.members.update(&loan.matricule, |m| {
            Ok(m.record_return(&loan.isbn, &loan.barcode, now))
        });
        if let Err(e) = recorded {
            tracing::warn!(matricule = %loan.matricule, error = %e, "Borrower no longer registered");
        }

        if let Some(until) = suspended_until {
            tracing::warn!(
                actor = %loan.matricule,
                action = "suspend",
                target = %loan.id,
                until = %until,
                "Late return, member suspended"
            );
        }
        tracing::info!(
            actor = %loan.matricule,
            action = "return",
            target = %loan.isbn,
            barcode = %loan.barcode,
            loan = %loan.id,
            "Loan returned"
        );

        self.reservations.process_queue(&loan.isbn);
        Ok(loan)
    }

    /// Renew for the configured number of days
    pub fn renew(&self, loan_id: &str) -> AppResult<bool> {
        self.renew_for(loan_id, self.config.renewal_days)
    }

    /// Push the due date back by `days`. Returns false when the loan is returned,
    /// overdue or out of renewals; nothing is written in that case.
    pub fn renew_for(&self, loan_id: &str, days: i64) -> AppResult<bool> {
        let loan = self.repository.loans.get(loan_id)?;
        Loan::due_date(loan.due_at, days)?;
        let now = self.clock.now();
        let max = self.config.max_renewals;
        if !loan.can_renew(now, max) {
            tracing::info!(
                actor = %loan.matricule,
                action = "renew",
                target = %loan.id,
                renewals = loan.renewals,
                "Renewal refused"
            );
            return Ok(false);
        }

        let renewed = self.repository.loans.modify(now, |b| {
            let loan = b
                .loans
                .get_mut(loan_id)
                .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))?;
            Ok(loan.renew(days, now, max)?.then(|| loan.clone()))
        })?;

        match renewed {
            Some(loan) => {
                tracing::info!(
                    actor = %loan.matricule,
                    action = "renew",
                    target = %loan.id,
                    due_at = %loan.due_at,
                    renewals = loan.renewals,
                    "Loan renewed"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Suspend every member holding an overdue loan: `days late x factor` from now.
    /// Returns the number of suspensions written.
    pub fn apply_penalties(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let factor = self.config.suspension_factor;
        let applied = self.repository.loans.modify(now, |b| {
            let penalties: Vec<(String, i64)> = b
                .loans
                .values()
                .filter(|l| l.is_overdue(now))
                .map(|l| (l.matricule.clone(), l.days_late(now)))
                .filter(|(_, days)| *days > 0)
                .collect();
            for (matricule, days) in &penalties {
                b.suspend(matricule, now + Duration::days(days * factor));
            }
            Ok(penalties.len())
        })?;
        tracing::info!(actor = "system", action = "apply_penalties", count = applied, "Penalties applied");
        Ok(applied)
    }

    pub fn get(&self, loan_id: &str) -> AppResult<Loan> {
        self.repository.loans.get(loan_id)
    }

    pub fn status(&self, loan: &Loan) -> LoanStatus {
        loan.status(self.clock.now())
    }

    pub fn list_by_member(&self, matricule: &str) -> Vec<Loan> {
        self.repository.loans.filter(|l| l.matricule == matricule)
    }

    pub fn list_active_by_member(&self, matricule: &str) -> Vec<Loan> {
        self.repository
            .loans
            .filter(|l| l.matricule == matricule && !l.is_returned())
    }

    pub fn list_active(&self) -> Vec<Loan> {
        self.repository.loans.filter(|l| !l.is_returned())
    }

    /// Loans still out past their due date
    pub fn list_overdue(&self) -> Vec<Loan> {
        let now = self.clock.now();
        self.repository.loans.filter(|l| l.is_overdue(now))
    }

    pub fn list_all(&self) -> Vec<Loan> {
        self.repository.loans.filter(|_| true)
    }

    /// Suspensions in force, expired ones pruned
    pub fn list_suspensions(&self) -> Vec<(String, DateTime<Utc>)> {
        self.repository.loans.suspensions(self.clock.now())
    }

    pub fn suspension_of(&self, matricule: &str) -> Option<DateTime<Utc>> {
        self.repository
            .loans
            .active_suspension(matricule, self.clock.now())
    }

    pub fn reload(&self) {
        self.repository.loans.reload()
    }
}
