//! Catalog menu

use std::io::{BufRead, Write};

use super::prompt::split_list;
use super::table::Table;
use super::{Console, ConsoleResult};
use crate::models::{
    datetime::format_timestamp, Book, BookCategory, BookStatus, BookUpdate, NewBook, NewSpecimen,
    SpecimenStatus,
};
use crate::services::catalog::SearchCriteria;

const BOOK_MENU: &[(&str, &str)] = &[
    ("1", "Add a book"),
    ("2", "Update a book"),
    ("3", "Remove a book"),
    ("4", "Show a book"),
    ("5", "List books"),
    ("6", "Search"),
    ("7", "Add a specimen"),
    ("8", "Remove a specimen"),
    ("9", "Mark a specimen (lost, damaged...)"),
    ("0", "Back"),
];

pub(crate) fn books_table(books: &[Book]) -> Table {
    let mut table = Table::new(["ISBN", "Title", "Author", "Year", "Category", "Status", "Available"]);
    for book in books {
        table.row([
            book.isbn.clone(),
            book.title.clone(),
            book.author.clone(),
            book.publication_year.to_string(),
            book.category.to_string(),
            book.status().to_string(),
            format!("{}/{}", book.available_count(), book.specimens().len()),
        ]);
    }
    table
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub(super) fn books_menu(&mut self) -> ConsoleResult<()> {
        self.submenu("Books and specimens", BOOK_MENU, |c, choice| {
            match choice {
                "1" => c.add_book()?,
                "2" => c.update_book()?,
                "3" => c.remove_book()?,
                "4" => c.show_book()?,
                "5" => {
                    let books = c.services.catalog.list_books();
                    c.print_books(&books)?
                }
                "6" => c.search_books()?,
                "7" => c.add_specimen()?,
                "8" => c.remove_specimen()?,
                "9" => c.mark_specimen()?,
                _ => return Ok(false),
            }
            Ok(true)
        })
    }

    fn print_books(&mut self, books: &[Book]) -> ConsoleResult<()> {
        if books.is_empty() {
            return self.say("No books.");
        }
        self.say(books_table(books))
    }

    fn add_book(&mut self) -> ConsoleResult<()> {
        let request = NewBook {
            isbn: self.required("ISBN")?,
            title: self.required("Title")?,
            author: self.required("Author")?,
            publisher: self.required("Publisher")?,
            publication_year: self.parsed("Publication year")?,
            category: self
                .optional_parsed::<BookCategory>("Category")?
                .unwrap_or_default(),
            keywords: self
                .optional("Keywords, comma separated")?
                .map(|k| split_list(&k))
                .unwrap_or_default(),
        };
        let book = self.services.catalog.add_book(request)?;
        self.say(format!("Book added: {} ({})", book.title, book.isbn))
    }

    fn update_book(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let current = self.services.catalog.get_book(&isbn)?;
        self.say(format!("Editing '{}'. Leave a field blank to keep it.", current.title))?;
        let update = BookUpdate {
            title: self.optional("Title")?,
            author: self.optional("Author")?,
            publisher: self.optional("Publisher")?,
            publication_year: self.optional_parsed("Publication year")?,
            category: self.optional_parsed("Category")?,
            keywords: self.optional("Keywords, comma separated")?.map(|k| split_list(&k)),
        };
        if update.is_empty() {
            return self.say("Nothing to change.");
        }
        let book = self.services.catalog.update_book(&isbn, update)?;
        self.say(format!("Book updated: {}", book.title))
    }

    fn remove_book(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let book = self.services.catalog.get_book(&isbn)?;
        if !self.confirm(&format!(
            "Remove '{}' and its {} specimen(s)?",
            book.title,
            book.specimens().len()
        ))? {
            return self.say("Cancelled.");
        }
        let removed = self.services.catalog.remove_book(&isbn)?;
        self.say(format!("Book removed: {}", removed.title))
    }

    fn show_book(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let book = self.services.catalog.get_book(&isbn)?;
        self.say(format!("{} by {}", book.title, book.author))?;
        self.say(format!(
            "ISBN {} | {} {} | {} | {}",
            book.isbn, book.publisher, book.publication_year, book.category, book.status()
        ))?;
        if !book.keywords.is_empty() {
            self.say(format!("Keywords: {}", book.keywords.join(", ")))?;
        }
        self.say(format!(
            "Borrowed {} time(s), added {}",
            book.borrow_count,
            format_timestamp(&book.added_at)
        ))?;
        if book.specimens().is_empty() {
            return self.say("No specimens.");
        }
        let mut table = Table::new(["Barcode", "Status", "Condition", "Location", "Acquired"]);
        for specimen in book.specimens() {
            table.row([
                specimen.barcode.clone(),
                specimen.status.to_string(),
                specimen.condition.clone(),
                specimen.location.clone(),
                format_timestamp(&specimen.acquired_at),
            ]);
        }
        self.say(table)?;
        let queue = self.services.reservations.list_queue_for(&book.isbn);
        if !queue.is_empty() {
            self.say(format!("{} member(s) waiting for this book.", queue.len()))?;
        }
        Ok(())
    }

    fn search_books(&mut self) -> ConsoleResult<()> {
        self.say("Any field matches; leave all blank to list everything.")?;
        let criteria = SearchCriteria {
            isbn: self.optional("ISBN")?,
            title: self.optional("Title contains")?,
            author: self.optional("Author contains")?,
            publisher: self.optional("Publisher contains")?,
            category: self.optional_parsed::<BookCategory>("Category")?,
            year: self.optional_parsed("Publication year")?,
            status: self.optional_parsed::<BookStatus>("Status")?,
            text: self.optional("Free text")?,
        };
        let books = self.services.catalog.search(&criteria);
        self.print_books(&books)
    }

    fn add_specimen(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let request = NewSpecimen {
            barcode: self.required("Barcode (5 characters)")?,
            condition: self.optional("Condition")?,
            location: self.optional("Location")?,
        };
        let specimen = self.services.catalog.add_specimen(&isbn, request)?;
        self.say(format!("Specimen {} added.", specimen.barcode))
    }

    fn remove_specimen(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let barcode = self.required("Barcode")?;
        if self.services.catalog.remove_specimen(&isbn, &barcode) {
            self.say("Specimen removed.")
        } else {
            self.say("No such specimen.")
        }
    }

    fn mark_specimen(&mut self) -> ConsoleResult<()> {
        let isbn = self.required("ISBN")?;
        let barcode = self.required("Barcode")?;
        let choices: Vec<String> = SpecimenStatus::ALL
            .iter()
            .filter(|s| **s != SpecimenStatus::OnLoan)
            .map(|s| s.to_string())
            .collect();
        self.say(format!("Statuses: {}", choices.join(", ")))?;
        let status: SpecimenStatus = self.parsed("New status")?;
        let specimen = self.services.catalog.mark_specimen(&isbn, &barcode, status)?;
        self.say(format!("Specimen {} is now {}.", specimen.barcode, specimen.status))
    }
}
