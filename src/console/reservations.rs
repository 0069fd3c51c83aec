//! Reservations menu

use std::io::{BufRead, Write};

use super::table::Table;
use super::{Console, ConsoleResult};
use crate::models::{datetime::format_timestamp, Reservation};

const RESERVATION_MENU: &[(&str, &str)] = &[
    ("1", "Reserve a book"),
    ("2", "Confirm a notified reservation"),
    ("3", "Cancel a reservation"),
    ("4", "Show a reservation"),
    ("5", "Reservations of a member"),
    ("6", "Waiting queue of a book"),
    ("7", "All reservations"),
    ("8", "Process the queue of a book"),
    ("9", "Notifications"),
    ("0", "Back"),
];

fn reservations_table(reservations: &[Reservation]) -> Table {
    let mut table = Table::new(["Id", "Member", "ISBN", "Created", "Status"]);
    for r in reservations {
        table.row([
            r.id.clone(),
            r.matricule.clone(),
            r.isbn.clone(),
            format_timestamp(&r.created_at),
            r.status().to_string(),
        ]);
    }
    table
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub(super) fn reservations_menu(&mut self) -> ConsoleResult<()> {
        self.submenu("Reservations", RESERVATION_MENU, |c, choice| {
            match choice {
                "1" => {
                    let matricule = c.required("Matricule")?;
                    let isbn = c.required("ISBN")?;
                    let reservation = c.services.reservations.reserve(&matricule, &isbn)?;
                    let position = c.services.reservations.list_queue_for(&isbn).len();
                    c.say(format!(
                        "Reservation {} recorded, position {} in the queue.",
                        reservation.id, position
                    ))?
                }
                "2" => {
                    let id = c.required("Reservation id")?;
                    if c.services.reservations.confirm(&id) {
                        c.say("Reservation confirmed, loan created.")?
                    } else {
                        c.say("Not confirmed: unknown, not notified, or the loan was refused.")?
                    }
                }
                "3" => {
                    let id = c.required("Reservation id")?;
                    if c.services.reservations.cancel(&id)? {
                        c.say("Reservation cancelled.")?
                    } else {
                        c.say("No such reservation.")?
                    }
                }
                "4" => {
                    let id = c.required("Reservation id")?;
                    let reservation = c.services.reservations.get(&id)?;
                    c.say(reservations_table(&[reservation]))?
                }
                "5" => {
                    let matricule = c.required("Matricule")?;
                    let list = c.services.reservations.list_by_member(&matricule);
                    c.print_reservations(&list)?
                }
                "6" => {
                    let isbn = c.required("ISBN")?;
                    let list = c.services.reservations.list_queue_for(&isbn);
                    c.print_reservations(&list)?
                }
                "7" => {
                    let list = c.services.reservations.list_all();
                    c.print_reservations(&list)?
                }
                "8" => {
                    let isbn = c.required("ISBN")?;
                    match c.services.reservations.process_queue(&isbn) {
                        Some(id) => c.say(format!("Reservation {} notified.", id))?,
                        None => c.say("Nobody to notify.")?,
                    }
                }
                "9" => {
                    let lines = c.services.reservations.notifications()?;
                    if lines.is_empty() {
                        c.say("No notifications.")?
                    }
                    for line in lines {
                        c.say(line)?;
                    }
                }
                _ => return Ok(false),
            }
            Ok(true)
        })
    }

    fn print_reservations(&mut self, reservations: &[Reservation]) -> ConsoleResult<()> {
        if reservations.is_empty() {
            return self.say("No reservations.");
        }
        self.say(reservations_table(reservations))
    }
}
