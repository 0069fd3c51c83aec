//! Statistics service: inventory and activity figures, text report

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::{
    clock::SharedClock,
    error::AppResult,
    models::{Book, SpecimenStatus},
    repository::{books::isbn_key, write_atomically, Repository},
};

const REPORT_WIDTH: usize = 70;
pub const DEFAULT_TOP: usize = 5;

/// Specimen counts per status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub total: usize,
    pub by_status: Vec<(SpecimenStatus, usize)>,
}

impl Inventory {
    pub fn count(&self, status: SpecimenStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CirculationSummary {
    pub books: usize,
    pub members: usize,
    pub active_members: usize,
    pub total_loans: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
    pub open_reservations: usize,
    pub suspended_members: usize,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    clock: SharedClock,
}

impl StatsService {
    pub fn new(repository: Repository, clock: SharedClock) -> Self {
        Self { repository, clock }
    }

    pub fn inventory(&self) -> Inventory {
        let books = self.repository.books.list();
        let by_status = SpecimenStatus::ALL
            .iter()
            .map(|status| {
                let n = books
                    .iter()
                    .flat_map(|b| b.specimens())
                    .filter(|s| s.status == *status)
                    .count();
                (*status, n)
            })
            .collect();
        Inventory {
            total: books.iter().map(|b| b.specimens().len()).sum(),
            by_status,
        }
    }

    pub fn summary(&self) -> CirculationSummary {
        let now = self.clock.now();
        let members = self.repository.members.list();
        let loans = self.repository.loans.filter(|_| true);
        CirculationSummary {
            books: self.repository.books.count(),
            members: members.len(),
            active_members: members.iter().filter(|m| m.is_active()).count(),
            total_loans: loans.len(),
            active_loans: loans.iter().filter(|l| !l.is_returned()).count(),
            overdue_loans: loans.iter().filter(|l| l.is_overdue(now)).count(),
            open_reservations: self.repository.reservations.filter(|r| r.is_open()).len(),
            suspended_members: self.repository.loans.suspensions(now).len(),
        }
    }

    /// Total loans ever made, returned or not
    pub fn total_loans(&self) -> usize {
        self.repository.loans.count()
    }

    /// Books no loan has ever referenced
    pub fn never_borrowed(&self) -> Vec<Book> {
        let borrowed: Vec<String> = self
            .repository
            .loans
            .filter(|_| true)
            .iter()
            .map(|l| isbn_key(&l.isbn))
            .collect();
        self.repository
            .books
            .filter(|b| !borrowed.contains(&isbn_key(&b.isbn)))
    }

    /// Most borrowed ISBNs with their loan count, ties in first-loan order
    pub fn top_books(&self, n: usize) -> Vec<(String, usize)> {
        top(self.repository.loans.filter(|_| true).iter().map(|l| l.isbn.clone()), n)
    }

    /// Members with the most loans, ties in first-loan order
    pub fn top_members(&self, n: usize) -> Vec<(String, usize)> {
        top(
            self.repository
                .loans
                .filter(|_| true)
                .iter()
                .map(|l| l.matricule.clone()),
            n,
        )
    }

    /// Plain-text report: inventory, activity, never borrowed, top books and members
    pub fn report(&self) -> String {
        let mut out = String::new();
        let inventory = self.inventory();
        let summary = self.summary();

        heading(&mut out, "INVENTORY");
        let _ = writeln!(out, "{:<15} | {:<10}", "Status", "Count");
        let _ = writeln!(out, "{}", "-".repeat(30));
        let _ = writeln!(out, "{:<15} | {:<10}", "Total", inventory.total);
        for (status, n) in &inventory.by_status {
            let _ = writeln!(out, "{:<15} | {:<10}", status.to_string(), n);
        }

        heading(&mut out, "ACTIVITY");
        let _ = writeln!(out, "* Loans (all time)   : {}", summary.total_loans);
        let _ = writeln!(out, "* Loans in progress  : {}", summary.active_loans);
        let _ = writeln!(out, "* Overdue loans      : {}", summary.overdue_loans);
        let _ = writeln!(out, "* Open reservations  : {}", summary.open_reservations);
        let _ = writeln!(
            out,
            "* Members            : {} ({} active, {} suspended)",
            summary.members, summary.active_members, summary.suspended_members
        );

        heading(&mut out, "NEVER BORROWED");
        let never = self.never_borrowed();
        if never.is_empty() {
            let _ = writeln!(out, "Every book has been borrowed at least once.");
        } else {
            let _ = writeln!(out, "Count: {}", never.len());
            for book in never.iter().take(10) {
                let _ = writeln!(out, "  -> {} ({})", book.title, book.isbn);
            }
        }

        heading(&mut out, &format!("TOP {} BOOKS", DEFAULT_TOP));
        let top_books = self.top_books(DEFAULT_TOP);
        if top_books.is_empty() {
            let _ = writeln!(out, "No loans recorded.");
        } else {
            let _ = writeln!(out, "{:<6} {:<30} {:<10}", "Rank", "Title", "Loans");
            let _ = writeln!(out, "{}", "-".repeat(60));
            for (rank, (isbn, count)) in top_books.iter().enumerate() {
                let title = self
                    .repository
                    .books
                    .get(isbn)
                    .map(|b| b.title)
                    .unwrap_or_else(|_| isbn.clone());
                let _ = writeln!(out, "{:<6} {:<30} {:<10}", rank + 1, truncate(&title, 28), count);
            }
        }

        heading(&mut out, &format!("TOP {} MEMBERS", DEFAULT_TOP));
        let top_members = self.top_members(DEFAULT_TOP);
        if top_members.is_empty() {
            let _ = writeln!(out, "No loans recorded.");
        } else {
            let _ = writeln!(out, "{:<6} {:<30} {:<10}", "Rank", "Name", "Loans");
            let _ = writeln!(out, "{}", "-".repeat(60));
            for (rank, (matricule, count)) in top_members.iter().enumerate() {
                let name = self
                    .repository
                    .members
                    .get(matricule)
                    .map(|m| m.full_name())
                    .unwrap_or_else(|_| matricule.clone());
                let _ = writeln!(out, "{:<6} {:<30} {:<10}", rank + 1, truncate(&name, 28), count);
            }
        }

        let _ = writeln!(out, "\n{}", "=".repeat(REPORT_WIDTH));
        out
    }

    /// Write the report to `dir/report_<YYYYmmdd_HHMMSS>.txt` and return its path
    pub fn export_report(&self, dir: &Path) -> AppResult<PathBuf> {
        let stamp = self.clock.now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("report_{}.txt", stamp));
        write_atomically(&path, self.report().as_bytes())?;
        tracing::info!(actor = "librarian", action = "export_report", target = %path.display(), "Report exported");
        Ok(path)
    }
}

fn heading(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let rule = "=".repeat(REPORT_WIDTH);
    let _ = writeln!(out, "{}\n{:^width$}\n{}", rule, title, rule, width = REPORT_WIDTH);
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn top(keys: impl Iterator<Item = String>, n: usize) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // stable: equal counts keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}
