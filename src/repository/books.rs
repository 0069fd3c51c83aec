//! Books repository (catalog store, `books.json`)

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;
use validator::Validate;

use super::{decode_records, Document, JsonStore, PersistenceWarnings};
use crate::{
    error::{AppError, AppResult},
    models::Book,
    validation::normalize_isbn,
};

/// Lookup key for an ISBN: separators removed, uppercased
pub fn isbn_key(isbn: &str) -> String {
    normalize_isbn(isbn).to_uppercase()
}

/// Books keyed by [`isbn_key`], in insertion order
#[derive(Debug, Default)]
pub struct Catalog {
    pub books: IndexMap<String, Book>,
}

impl Catalog {
    pub fn get(&self, isbn: &str) -> Option<&Book> {
        self.books.get(&isbn_key(isbn))
    }

    pub fn get_mut(&mut self, isbn: &str) -> Option<&mut Book> {
        self.books.get_mut(&isbn_key(isbn))
    }

    /// Whether any specimen in the catalog carries `barcode`
    pub fn barcode_in_use(&self, barcode: &str) -> bool {
        self.books.values().any(|b| b.has_barcode(barcode))
    }

    pub fn specimen_id_taken(&self, id: &str) -> bool {
        self.books
            .values()
            .any(|b| b.specimens().iter().any(|s| s.id == id))
    }

    pub fn book_id_taken(&self, id: &str) -> bool {
        self.books.values().any(|b| b.id == id)
    }
}

impl Document for Catalog {
    const KIND: &'static str = "books";

    fn encode(&self) -> AppResult<String> {
        let books: Vec<&Book> = self.books.values().collect();
        Ok(serde_json::to_string_pretty(&books)?)
    }

    fn decode(value: Value) -> Self {
        let mut catalog = Catalog::default();
        for book in decode_records::<Book>(Self::KIND, value, |b| b.validate().map_err(|e| e.to_string())) {
            let key = isbn_key(&book.isbn);
            if catalog.books.contains_key(&key) {
                tracing::warn!(store = Self::KIND, isbn = %book.isbn, "Skipping duplicate ISBN");
                continue;
            }
            if let Some(specimen) = book.specimens().iter().find(|s| catalog.barcode_in_use(&s.barcode)) {
                tracing::warn!(store = Self::KIND, isbn = %book.isbn, barcode = %specimen.barcode, "Skipping book with a duplicate barcode");
                continue;
            }
            catalog.books.insert(key, book);
        }
        catalog
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    store: JsonStore<Catalog>,
}

impl BooksRepository {
    pub fn open(path: PathBuf, warnings: PersistenceWarnings) -> Self {
        Self {
            store: JsonStore::open(path, warnings),
        }
    }

    pub fn count(&self) -> usize {
        self.store.read(|c| c.books.len())
    }

    pub fn get(&self, isbn: &str) -> AppResult<Book> {
        self.store
            .read(|c| c.get(isbn).cloned())
            .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))
    }

    pub fn list(&self) -> Vec<Book> {
        self.store.read(|c| c.books.values().cloned().collect())
    }

    /// Books for which `predicate` holds, in catalog order
    pub fn filter(&self, predicate: impl Fn(&Book) -> bool) -> Vec<Book> {
        self.store
            .read(|c| c.books.values().filter(|b| predicate(b)).cloned().collect())
    }

    pub fn book_id_taken(&self, id: &str) -> bool {
        self.store.read(|c| c.book_id_taken(id))
    }

    pub fn insert(&self, book: Book) -> AppResult<Book> {
        self.store.update(|c| {
            let key = isbn_key(&book.isbn);
            if c.books.contains_key(&key) {
                return Err(AppError::DuplicateIsbn(book.isbn.clone()));
            }
            c.books.insert(key, book.clone());
            Ok(book)
        })
    }

    pub fn remove(&self, isbn: &str) -> AppResult<Book> {
        self.store.update(|c| {
            c.books
                .shift_remove(&isbn_key(isbn))
                .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))
        })
    }

    /// Mutate one book in place; `BookNotFound` if absent
    pub fn update<R>(&self, isbn: &str, f: impl FnOnce(&mut Book) -> AppResult<R>) -> AppResult<R> {
        self.store.update(|c| {
            let book = c
                .get_mut(isbn)
                .ok_or_else(|| AppError::BookNotFound(isbn.to_string()))?;
            f(book)
        })
    }

    /// Mutate the whole catalog, for checks that span several books
    pub fn modify<R>(&self, f: impl FnOnce(&mut Catalog) -> AppResult<R>) -> AppResult<R> {
        self.store.update(f)
    }

    pub fn reload(&self) {
        self.store.reload()
    }
}
