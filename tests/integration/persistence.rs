//! Data files: write-through, reloading and tolerant loading

use std::fs;

use crate::common::{Desk, DUNE, PETIT_PRINCE};
use elidune_desk::{
    models::{BookStatus, LoanStatus, MemberCategory, ReservationStatus},
    AppError,
    repository::{BOOKS_FILE, LOANS_FILE, MEMBERS_FILE, NOTIFICATIONS_FILE, RESERVATIONS_FILE},
};
use serde_json::{json, Value};

fn read_json(desk: &Desk, file: &str) -> Value {
    let raw = fs::read_to_string(desk.dir.path().join(file)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn write_json(desk: &Desk, file: &str, value: &Value) {
    fs::write(
        desk.dir.path().join(file),
        serde_json::to_string_pretty(value).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_state_survives_a_restart() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    let bob = desk.member("Bob", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.book(DUNE, "Dune", &["00002"]);

    let loan = desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();
    let reservation = desk.services.reservations.reserve(&bob.matricule, PETIT_PRINCE).unwrap();
    let late = desk.services.loans.borrow(&bob.matricule, DUNE, None).unwrap();
    desk.advance_days(16);
    desk.services.loans.return_loan(&late.id).unwrap();

    let reopened = desk.reopen();
    assert_eq!(reopened.catalog.list_books().len(), 2);
    assert_eq!(
        reopened.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::OnLoan
    );
    let member = reopened.members.get(&alice.matricule).unwrap();
    assert_eq!(member.loan_count(), 1);
    assert_eq!(member.current_loans()[0].barcode, "00001");

    let restored = reopened.loans.get(&loan.id).unwrap();
    assert_eq!(restored, loan);
    assert_eq!(reopened.loans.status(&restored), LoanStatus::Overdue);
    assert_eq!(
        reopened.loans.suspension_of(&bob.matricule),
        desk.services.loans.suspension_of(&bob.matricule)
    );
    assert_eq!(
        reopened.reservations.list_queue_for(PETIT_PRINCE)[0].id,
        reservation.id
    );

    // The reopened services keep working against the same files
    reopened.loans.return_loan(&loan.id).unwrap();
    assert_eq!(
        reopened.reservations.get(&reservation.id).unwrap().status(),
        ReservationStatus::Notified
    );
}

#[test]
fn test_file_shapes() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    let bob = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    let loan = desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();
    desk.services.reservations.reserve(&bob.matricule, PETIT_PRINCE).unwrap();

    let books = read_json(&desk, BOOKS_FILE);
    let book = &books.as_array().unwrap()[0];
    assert_eq!(book["isbn"], PETIT_PRINCE);
    assert_eq!(book["specimens"][0]["status"], "on_loan");
    assert_eq!(book["added_at"], "2025-03-03T10:00:00Z");

    let members = read_json(&desk, MEMBERS_FILE);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let loans = read_json(&desk, LOANS_FILE);
    assert_eq!(loans["loans"][0]["id"], loan.id.as_str());
    assert_eq!(loans["loans"][0]["due_at"], "2025-03-17T10:00:00Z");
    assert!(loans["loans"][0]["returned_at"].is_null());
    assert!(loans["suspensions"].as_object().unwrap().is_empty());

    let reservations = read_json(&desk, RESERVATIONS_FILE);
    assert_eq!(reservations["reservations"][0]["status"], "pending");
    assert_eq!(reservations["files"]["9782070408504"].as_array().unwrap().len(), 1);
    assert!(reservations.get("queues").is_none());

    // No temporary file is left behind
    let leftovers = fs::read_dir(desk.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn test_queue_loaded_from_files_key() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    let bob = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    let loan = desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();

    write_json(
        &desk,
        RESERVATIONS_FILE,
        &json!({
            "reservations": [{
                "id": "RES-0000BOB1",
                "matricule": bob.matricule,
                "isbn": PETIT_PRINCE,
                "created_at": "2025-03-03T10:00:00",
                "status": "pending"
            }],
            "files": { PETIT_PRINCE: ["RES-0000BOB1"] }
        }),
    );

    let reopened = desk.reopen();
    assert_eq!(reopened.reservations.list_queue_for(PETIT_PRINCE).len(), 1);
    reopened.loans.return_loan(&loan.id).unwrap();
    assert_eq!(
        reopened.reservations.get("RES-0000BOB1").unwrap().status(),
        ReservationStatus::Notified
    );
}

#[test]
fn test_failed_write_keeps_the_operation() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    assert!(desk.services.take_warnings().is_empty());

    // A directory where the loans file should be makes every loans write fail
    fs::create_dir(desk.dir.path().join(LOANS_FILE)).unwrap();

    let loan = desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();
    assert_eq!(desk.services.loans.get(&loan.id).unwrap(), loan);
    assert_eq!(desk.services.loans.list_active().len(), 1);
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::OnLoan
    );
    assert_eq!(desk.services.members.get(&alice.matricule).unwrap().loan_count(), 1);

    let warnings = desk.services.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(&warnings[0], AppError::Persistence(message) if message.starts_with("loans")));

    desk.services.loans.return_loan(&loan.id).unwrap();
    assert_eq!(desk.services.take_warnings().len(), 1);
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::Available
    );
}

#[test]
fn test_bad_records_are_skipped_on_load() {
    let desk = Desk::new();
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.member("Alice", MemberCategory::Student);

    let mut books = read_json(&desk, BOOKS_FILE);
    let mut duplicate = books[0].clone();
    duplicate["id"] = json!("LIV-DUPLICAT");
    let array = books.as_array_mut().unwrap();
    array.push(json!({ "isbn": 42 }));
    array.push(duplicate);
    write_json(&desk, BOOKS_FILE, &books);

    let mut members = read_json(&desk, MEMBERS_FILE);
    members[0]["email"] = json!("not an email");
    write_json(&desk, MEMBERS_FILE, &members);

    let reopened = desk.reopen();
    assert_eq!(reopened.catalog.list_books().len(), 1);
    assert!(reopened.members.list().is_empty());
}

#[test]
fn test_malformed_file_starts_empty() {
    let desk = Desk::new();
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    fs::write(desk.dir.path().join(BOOKS_FILE), "{ not json").unwrap();
    fs::write(desk.dir.path().join(LOANS_FILE), "").unwrap();
    write_json(&desk, RESERVATIONS_FILE, &json!("unexpected"));

    let reopened = desk.reopen();
    assert!(reopened.catalog.list_books().is_empty());
    assert!(reopened.loans.list_all().is_empty());
    assert!(reopened.reservations.list_all().is_empty());
}

#[test]
fn test_reload_picks_up_external_edits() {
    let desk = Desk::new();
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let other = desk.reopen();
    desk.book(DUNE, "Dune", &["00002"]);
    assert_eq!(other.catalog.list_books().len(), 1);

    other.reload();
    assert_eq!(other.catalog.list_books().len(), 2);
}

#[test]
fn test_notification_log_lines() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    let bob = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let loan = desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();
    let reservation = desk.services.reservations.reserve(&bob.matricule, PETIT_PRINCE).unwrap();
    desk.advance_days(3);
    desk.services.loans.return_loan(&loan.id).unwrap();

    let raw = fs::read_to_string(desk.dir.path().join(NOTIFICATIONS_FILE)).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[2025-03-06T10:00:00Z] "));
    assert!(lines[0].contains(&format!("Member {}", bob.matricule)));
    assert!(lines[0].contains(&format!("reservation {}", reservation.id)));
}

#[test]
fn test_export_report() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.book(DUNE, "Dune", &["00002"]);
    desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();

    let reports = desk.dir.path().join("reports");
    let path = desk.services.stats.export_report(&reports).unwrap();
    assert_eq!(path, reports.join("report_20250303_100000.txt"));

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("INVENTORY"));
    assert!(content.contains("Le Petit Prince"));
    assert!(content.contains("Dune"));
}
