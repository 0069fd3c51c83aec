//! Loans menu

use std::io::{BufRead, Write};

use super::table::Table;
use super::{Console, ConsoleResult};
use crate::models::{datetime::format_timestamp, Loan};

const LOAN_MENU: &[(&str, &str)] = &[
    ("1", "Borrow"),
    ("2", "Return"),
    ("3", "Renew"),
    ("4", "Loans of a member"),
    ("5", "Loans in progress of a member"),
    ("6", "Loans in progress"),
    ("7", "Overdue loans"),
    ("8", "All loans"),
    ("9", "Apply overdue penalties"),
    ("10", "Suspended members"),
    ("0", "Back"),
];

impl<R: BufRead, W: Write> Console<R, W> {
    pub(super) fn loans_menu(&mut self) -> ConsoleResult<()> {
        self.submenu("Loans", LOAN_MENU, |c, choice| {
            match choice {
                "1" => c.borrow()?,
                "2" => {
                    let id = c.required("Loan id")?;
                    let loan = c.services.loans.return_loan(&id)?;
                    let status = c.services.loans.status(&loan);
                    c.say(format!("Loan {} closed ({}).", loan.id, status))?;
                    if let Some(until) = c.services.loans.suspension_of(&loan.matricule) {
                        c.say(format!(
                            "Late return: member suspended until {}.",
                            format_timestamp(&until)
                        ))?;
                    }
                }
                "3" => {
                    let id = c.required("Loan id")?;
                    if c.services.loans.renew(&id)? {
                        let loan = c.services.loans.get(&id)?;
                        c.say(format!("Renewed, now due {}.", format_timestamp(&loan.due_at)))?
                    } else {
                        c.say("Renewal refused: returned, overdue or renewed too often.")?
                    }
                }
                "4" => {
                    let matricule = c.required("Matricule")?;
                    let loans = c.services.loans.list_by_member(&matricule);
                    c.print_loans(&loans)?
                }
                "5" => {
                    let matricule = c.required("Matricule")?;
                    let loans = c.services.loans.list_active_by_member(&matricule);
                    c.print_loans(&loans)?
                }
                "6" => {
                    let loans = c.services.loans.list_active();
                    c.print_loans(&loans)?
                }
                "7" => {
                    let loans = c.services.loans.list_overdue();
                    c.print_loans(&loans)?
                }
                "8" => {
                    let loans = c.services.loans.list_all();
                    c.print_loans(&loans)?
                }
                "9" => {
                    let count = c.services.loans.apply_penalties()?;
                    c.say(format!("{} suspension(s) applied.", count))?
                }
                "10" => c.list_suspensions()?,
                _ => return Ok(false),
            }
            Ok(true)
        })
    }

    fn borrow(&mut self) -> ConsoleResult<()> {
        let matricule = self.required("Matricule")?;
        let isbn = self.required("ISBN")?;
        let barcode = self.optional("Barcode")?;
        let loan = self
            .services
            .loans
            .borrow(&matricule, &isbn, barcode.as_deref())?;
        self.say(format!(
            "Loan {}: specimen {} due {}.",
            loan.id,
            loan.barcode,
            format_timestamp(&loan.due_at)
        ))
    }

    fn print_loans(&mut self, loans: &[Loan]) -> ConsoleResult<()> {
        if loans.is_empty() {
            return self.say("No loans.");
        }
        let mut table = Table::new(["Id", "Member", "ISBN", "Barcode", "Borrowed", "Due", "Returned", "Renewals", "Status"]);
        for loan in loans {
            table.row([
                loan.id.clone(),
                loan.matricule.clone(),
                loan.isbn.clone(),
                loan.barcode.clone(),
                format_timestamp(&loan.borrowed_at),
                format_timestamp(&loan.due_at),
                loan.returned_at.as_ref().map(format_timestamp).unwrap_or_default(),
                loan.renewals.to_string(),
                self.services.loans.status(loan).to_string(),
            ]);
        }
        self.say(table)
    }

    fn list_suspensions(&mut self) -> ConsoleResult<()> {
        let suspensions = self.services.loans.list_suspensions();
        if suspensions.is_empty() {
            return self.say("Nobody is suspended.");
        }
        let mut table = Table::new(["Matricule", "Suspended until"]);
        for (matricule, until) in &suspensions {
            table.row([matricule.clone(), format_timestamp(until)]);
        }
        self.say(table)
    }
}
