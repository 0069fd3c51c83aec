//! Statistics menu

use std::io::{BufRead, Write};

use super::books::books_table;
use super::{Console, ConsoleResult};

const REPORT_MENU: &[(&str, &str)] = &[
    ("1", "Show the full report"),
    ("2", "Books never borrowed"),
    ("3", "Export the report to a file"),
    ("0", "Back"),
];

impl<R: BufRead, W: Write> Console<R, W> {
    pub(super) fn reports_menu(&mut self) -> ConsoleResult<()> {
        self.submenu("Statistics and reports", REPORT_MENU, |c, choice| {
            match choice {
                "1" => {
                    let report = c.services.stats.report();
                    c.say(report)?
                }
                "2" => {
                    let books = c.services.stats.never_borrowed();
                    if books.is_empty() {
                        c.say("Every book has been borrowed at least once.")?
                    } else {
                        c.say(books_table(&books))?
                    }
                }
                "3" => {
                    let dir = c.reports_dir.clone();
                    let path = c.services.stats.export_report(&dir)?;
                    c.say(format!("Report written to {}", path.display()))?
                }
                _ => return Ok(false),
            }
            Ok(true)
        })
    }
}
