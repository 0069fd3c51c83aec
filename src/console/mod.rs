//! Menu-driven text console over the services

mod books;
mod loans;
mod members;
mod prompt;
mod reports;
mod reservations;
mod table;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::{error::AppError, services::Services};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Console I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("End of input")]
    Eof,
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;

const MAIN_MENU: &[(&str, &str)] = &[
    ("1", "Books and specimens"),
    ("2", "Members"),
    ("3", "Loans"),
    ("4", "Reservations"),
    ("5", "Statistics and reports"),
    ("6", "Reload data from disk"),
    ("0", "Quit"),
];

/// Interactive session. Business errors are printed and the session goes on;
/// only end of input or a console I/O failure ends it.
pub struct Console<R, W> {
    services: Services,
    input: R,
    output: W,
    reports_dir: PathBuf,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(services: Services, input: R, output: W, reports_dir: PathBuf) -> Self {
        Self {
            services,
            input,
            output,
            reports_dir,
        }
    }

    pub fn run(&mut self) -> ConsoleResult<()> {
        self.say(format!("Elidune Desk v{}", env!("CARGO_PKG_VERSION")))?;
        loop {
            let choice = match self.menu("Main menu", MAIN_MENU) {
                Ok(choice) => choice,
                Err(ConsoleError::Eof) => break,
                Err(e) => return Err(e),
            };
            let outcome = match choice.as_str() {
                "1" => self.books_menu(),
                "2" => self.members_menu(),
                "3" => self.loans_menu(),
                "4" => self.reservations_menu(),
                "5" => self.reports_menu(),
                "6" => {
                    self.services.reload();
                    self.say("Data reloaded.")
                }
                "0" | "q" | "quit" => break,
                other => self.say(format!("Unknown choice '{}'.", other)),
            };
            match outcome {
                Ok(()) => self.report_warnings()?,
                Err(ConsoleError::Eof) => break,
                Err(e) => return Err(e),
            }
        }
        self.say("Goodbye.")?;
        Ok(())
    }

    /// Loop over a submenu until "0"; errors from one action are reported, not fatal
    fn submenu(
        &mut self,
        title: &str,
        entries: &[(&str, &str)],
        mut action: impl FnMut(&mut Self, &str) -> ConsoleResult<bool>,
    ) -> ConsoleResult<()> {
        loop {
            let choice = self.menu(title, entries)?;
            if choice == "0" {
                return Ok(());
            }
            match action(self, &choice) {
                Ok(true) => {}
                Ok(false) => self.say(format!("Unknown choice '{}'.", choice))?,
                Err(ConsoleError::App(e)) => self.report_error(&e)?,
                Err(e) => return Err(e),
            }
            self.report_warnings()?;
        }
    }

    /// Print write failures left behind by the last action. The action itself stood.
    fn report_warnings(&mut self) -> ConsoleResult<()> {
        for warning in self.services.take_warnings() {
            self.say(format!("Warning [{}]: {}", warning.code() as u32, warning))?;
        }
        Ok(())
    }

    fn report_error(&mut self, error: &AppError) -> ConsoleResult<()> {
        tracing::debug!(code = error.code() as u32, error = %error, "Operation refused");
        self.say(format!("Error [{}]: {}", error.code() as u32, error))
    }
}
