//! Catalog management service

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    ids::{generate_unique_id, BOOK_PREFIX, SPECIMEN_PREFIX},
    models::{
        book::fold_case, Book, BookCategory, BookStatus, BookUpdate, NewBook, NewSpecimen,
        Specimen, SpecimenStatus,
    },
    repository::{books::isbn_key, Repository},
    services::reservations::ReservationsService,
};

/// Catalog search; every set criterion is OR-combined, an empty one matches everything
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<BookCategory>,
    pub year: Option<i32>,
    pub status: Option<BookStatus>,
    /// Substring over title, author, publisher and keywords
    pub text: Option<String>,
}

impl SearchCriteria {
    pub fn text(token: impl Into<String>) -> Self {
        Self {
            text: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.isbn.is_none()
            && self.title.is_none()
            && self.author.is_none()
            && self.publisher.is_none()
            && self.category.is_none()
            && self.year.is_none()
            && self.status.is_none()
            && self.text.is_none()
    }

    pub fn matches(&self, book: &Book) -> bool {
        let contains = |field: &str, wanted: &Option<String>| {
            wanted
                .as_deref()
                .is_some_and(|w| fold_case(field).contains(&fold_case(w)))
        };

        self.isbn
            .as_deref()
            .is_some_and(|isbn| isbn_key(isbn) == isbn_key(&book.isbn))
            || contains(&book.title, &self.title)
            || contains(&book.author, &self.author)
            || contains(&book.publisher, &self.publisher)
            || self.category == Some(book.category)
            || self.year == Some(book.publication_year)
            || self.status == Some(book.status())
            || self.text.as_deref().is_some_and(|t| book.matches_text(t))
    }
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    clock: SharedClock,
    reservations: ReservationsService,
}

impl CatalogService {
    pub fn new(repository: Repository, clock: SharedClock, reservations: ReservationsService) -> Self {
        Self {
            repository,
            clock,
            reservations,
        }
    }

    /// Add a book to the catalog; its ISBN must not be in use
    pub fn add_book(&self, request: NewBook) -> AppResult<Book> {
        let id = generate_unique_id(BOOK_PREFIX, |id| self.repository.books.book_id_taken(id));
        let book = Book::new(id, request, self.clock.now())?;
        let book = self.repository.books.insert(book)?;
        tracing::info!(
            actor = "librarian",
            action = "add_book",
            target = %book.isbn,
            title = %book.title,
            "Book added"
        );
        Ok(book)
    }

    pub fn update_book(&self, isbn: &str, update: BookUpdate) -> AppResult<Book> {
        let now = self.clock.now();
        let book = self.repository.books.update(isbn, |book| {
            book.apply_update(update, now)?;
            Ok(book.clone())
        })?;
        tracing::info!(actor = "librarian", action = "update_book", target = %book.isbn, "Book updated");
        Ok(book)
    }

    /// Remove a book together with all its specimens
    pub fn remove_book(&self, isbn: &str) -> AppResult<Book> {
        let book = self.repository.books.remove(isbn)?;
        let on_loan = book
            .specimens()
            .iter()
            .filter(|s| s.status == SpecimenStatus::OnLoan)
            .count();
        if on_loan > 0 {
            tracing::warn!(isbn = %book.isbn, on_loan, "Removed a book with specimens still on loan");
        }
        tracing::info!(
            actor = "librarian",
            action = "remove_book",
            target = %book.isbn,
            specimens = book.specimens().len(),
            "Book removed"
        );
        Ok(book)
    }

    pub fn get_book(&self, isbn: &str) -> AppResult<Book> {
        self.repository.books.get(isbn)
    }

    pub fn list_books(&self) -> Vec<Book> {
        self.repository.books.list()
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Vec<Book> {
        if criteria.is_empty() {
            return self.list_books();
        }
        self.repository.books.filter(|b| criteria.matches(b))
    }

    /// Add a specimen. The barcode must be unused across the whole catalog.
    /// A new specimen may satisfy the head of the reservation queue.
    pub fn add_specimen(&self, isbn: &str, request: NewSpecimen) -> AppResult<Specimen> {
        let now = self.clock.now();
        let specimen = self.repository.books.modify(|catalog| {
            if catalog.get(isbn).is_none() {
                return Err(AppError::BookNotFound(isbn.to_string()));
            }
            if catalog.barcode_in_use(&request.barcode) {
                return Err(AppError::DuplicateBarcode(request.barcode.trim().to_string()));
            }
            let id = generate_unique_id(SPECIMEN_PREFIX, |id| catalog.specimen_id_taken(id));
            let specimen = Specimen::new(id, request, now)?;
            let book = catalog
                .get_mut(isbn)
                .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;
            book.add_specimen(specimen.clone());
            Ok(specimen)
        })?;

        tracing::info!(
            actor = "librarian",
            action = "add_specimen",
            target = %isbn,
            barcode = %specimen.barcode,
            "Specimen added"
        );
        self.reservations.process_queue(isbn);
        Ok(specimen)
    }

    /// Returns whether a specimen was found and removed
    pub fn remove_specimen(&self, isbn: &str, barcode: &str) -> bool {
        match self
            .repository
            .books
            .update(isbn, |book| Ok(book.remove_specimen(barcode)))
        {
            Ok(true) => {
                tracing::info!(actor = "librarian", action = "remove_specimen", target = %isbn, barcode = %barcode, "Specimen removed");
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::warn!(isbn = %isbn, error = %e, "Cannot remove specimen");
                false
            }
        }
    }

    /// Set a specimen aside (lost, damaged...) or put it back on the shelf.
    ///
    /// Specimens on loan are only changed by circulation.
    pub fn mark_specimen(&self, isbn: &str, barcode: &str, status: SpecimenStatus) -> AppResult<Specimen> {
        if status == SpecimenStatus::OnLoan {
            return Err(AppError::Validation(
                "status: specimens are put on loan by borrowing".to_string(),
            ));
        }
        let specimen = self.repository.books.update(isbn, |book| {
            let current = book.specimen(barcode).ok_or_else(|| AppError::SpecimenNotFound {
                isbn: book.isbn.clone(),
                barcode: barcode.to_string(),
            })?;
            if current.status == SpecimenStatus::OnLoan {
                return Err(AppError::CopyUnavailable(book.isbn.clone()));
            }
            book.set_specimen_status(barcode, status);
            book.specimen(barcode)
                .cloned()
                .ok_or_else(|| AppError::Internal("specimen vanished while marking".to_string()))
        })?;

        tracing::info!(
            actor = "librarian",
            action = "mark_specimen",
            target = %isbn,
            barcode = %barcode,
            status = %status,
            "Specimen status changed"
        );
        if status == SpecimenStatus::Available {
            self.reservations.process_queue(isbn);
        }
        Ok(specimen)
    }

    pub fn reload(&self) {
        self.repository.books.reload()
    }
}
