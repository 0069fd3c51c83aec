//! Members menu

use std::io::{BufRead, Write};

use super::table::Table;
use super::{Console, ConsoleResult};
use crate::models::{datetime::format_timestamp, Member, MemberCategory, MemberUpdate, NewMember};

const MEMBER_MENU: &[(&str, &str)] = &[
    ("1", "Register a member"),
    ("2", "Show a member"),
    ("3", "Find by email"),
    ("4", "List members"),
    ("5", "Edit a member"),
    ("6", "Change category"),
    ("7", "Activate"),
    ("8", "Deactivate"),
    ("9", "Remove a member"),
    ("0", "Back"),
];

fn category_hint() -> String {
    let labels: Vec<String> = MemberCategory::ALL
        .iter()
        .map(|c| format!("{} ({} loans)", c, c.loan_limit()))
        .collect();
    labels.join(", ")
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub(super) fn members_menu(&mut self) -> ConsoleResult<()> {
        self.submenu("Members", MEMBER_MENU, |c, choice| {
            match choice {
                "1" => c.register_member()?,
                "2" => {
                    let matricule = c.required("Matricule")?;
                    let member = c.services.members.get(&matricule)?;
                    c.print_member(&member)?
                }
                "3" => {
                    let email = c.required("Email")?;
                    match c.services.members.find_by_email(&email) {
                        Some(member) => c.print_member(&member)?,
                        None => c.say("No member with that email.")?,
                    }
                }
                "4" => c.list_members()?,
                "5" => c.edit_member()?,
                "6" => {
                    let matricule = c.required("Matricule")?;
                    c.say(format!("Categories: {}", category_hint()))?;
                    let category: MemberCategory = c.parsed("New category")?;
                    let member = c.services.members.change_category(&matricule, category)?;
                    c.say(format!("{} is now {}.", member.full_name(), member.category()))?
                }
                "7" => {
                    let matricule = c.required("Matricule")?;
                    let found = c.services.members.activate(&matricule);
                    c.say(if found { "Member active." } else { "No such member." })?
                }
                "8" => {
                    let matricule = c.required("Matricule")?;
                    let found = c.services.members.deactivate(&matricule);
                    c.say(if found { "Member inactive." } else { "No such member." })?
                }
                "9" => {
                    let matricule = c.required("Matricule")?;
                    if c.confirm(&format!("Remove member {}?", matricule))? {
                        let member = c.services.members.remove(&matricule)?;
                        c.say(format!("{} removed.", member.full_name()))?
                    }
                }
                _ => return Ok(false),
            }
            Ok(true)
        })
    }

    fn register_member(&mut self) -> ConsoleResult<()> {
        self.say(format!("Categories: {}", category_hint()))?;
        let request = NewMember {
            last_name: self.required("Last name")?,
            first_name: self.required("First name")?,
            email: self.required("Email")?,
            phone: self.required("Phone")?,
            category: self
                .optional_parsed::<MemberCategory>("Category")?
                .unwrap_or_default(),
        };
        let member = self.services.members.create(request)?;
        self.say(format!("Member registered: {} ({})", member.full_name(), member.matricule))
    }

    fn edit_member(&mut self) -> ConsoleResult<()> {
        let matricule = self.required("Matricule")?;
        let current = self.services.members.get(&matricule)?;
        self.say(format!("Editing {}. Leave a field blank to keep it.", current.full_name()))?;
        let update = MemberUpdate {
            last_name: self.optional("Last name")?,
            first_name: self.optional("First name")?,
            email: self.optional("Email")?,
            phone: self.optional("Phone")?,
        };
        let member = self.services.members.update(&matricule, update)?;
        self.say(format!("Member updated: {}", member.full_name()))
    }

    fn list_members(&mut self) -> ConsoleResult<()> {
        let members = self.services.members.list();
        if members.is_empty() {
            return self.say("No members.");
        }
        let mut table = Table::new(["Matricule", "Name", "Email", "Category", "Loans", "Active"]);
        for member in &members {
            table.row([
                member.matricule.clone(),
                member.full_name(),
                member.email.clone(),
                member.category().to_string(),
                format!("{}/{}", member.loan_count(), member.loan_limit()),
                if member.is_active() { "yes" } else { "no" }.to_string(),
            ]);
        }
        self.say(table)
    }

    fn print_member(&mut self, member: &Member) -> ConsoleResult<()> {
        self.say(format!("{} ({})", member.full_name(), member.matricule))?;
        self.say(format!("Email {} | Phone {}", member.email, member.phone))?;
        self.say(format!(
            "{} | {} | registered {}",
            member.category(),
            if member.is_active() { "active" } else { "inactive" },
            format_timestamp(&member.registered_at)
        ))?;
        if let Some(until) = self.services.loans.suspension_of(&member.matricule) {
            self.say(format!("Suspended until {}", format_timestamp(&until)))?;
        }
        self.say(format!(
            "Loans in hand: {}/{}",
            member.loan_count(),
            member.loan_limit()
        ))?;
        if !member.current_loans().is_empty() {
            let mut table = Table::new(["ISBN", "Barcode", "Since"]);
            for loan in member.current_loans() {
                table.row([
                    loan.isbn.clone(),
                    loan.barcode.clone(),
                    format_timestamp(&loan.borrowed_at),
                ]);
            }
            self.say(table)?;
        }
        self.say(format!("History: {} event(s)", member.history().len()))
    }
}
