//! Inventory and activity figures

use crate::common::{Desk, DUNE, FOUNDATION, PETIT_PRINCE};
use elidune_desk::models::{MemberCategory, SpecimenStatus};

#[test]
fn test_inventory_and_summary() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Student);
    let bob = desk.member("Bob", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002"]);
    desk.book(DUNE, "Dune", &["00003"]);
    desk.book(FOUNDATION, "Foundation", &[]);

    desk.services.loans.borrow(&alice.matricule, PETIT_PRINCE, None).unwrap();
    desk.services.loans.borrow(&bob.matricule, DUNE, None).unwrap();
    desk.services
        .catalog
        .mark_specimen(PETIT_PRINCE, "00002", SpecimenStatus::Lost)
        .unwrap();
    desk.services.reservations.reserve(&alice.matricule, DUNE).unwrap();
    desk.services.members.deactivate(&bob.matricule);

    let inventory = desk.services.stats.inventory();
    assert_eq!(inventory.total, 3);
    assert_eq!(inventory.count(SpecimenStatus::OnLoan), 2);
    assert_eq!(inventory.count(SpecimenStatus::Lost), 1);
    assert_eq!(inventory.count(SpecimenStatus::Available), 0);

    desk.advance_days(20);
    let summary = desk.services.stats.summary();
    assert_eq!(summary.books, 3);
    assert_eq!(summary.members, 2);
    assert_eq!(summary.active_members, 1);
    assert_eq!(summary.total_loans, 2);
    assert_eq!(summary.active_loans, 2);
    assert_eq!(summary.overdue_loans, 2);
    assert_eq!(summary.open_reservations, 1);
    assert_eq!(summary.suspended_members, 0);
}

#[test]
fn test_rankings_and_never_borrowed() {
    let desk = Desk::new();
    let alice = desk.member("Alice", MemberCategory::Teacher);
    let bob = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.book(DUNE, "Dune", &["00002"]);
    desk.book(FOUNDATION, "Foundation", &["00003"]);

    for _ in 0..2 {
        let loan = desk.services.loans.borrow(&alice.matricule, DUNE, None).unwrap();
        desk.services.loans.return_loan(&loan.id).unwrap();
    }
    desk.services.loans.borrow(&bob.matricule, PETIT_PRINCE, None).unwrap();

    assert_eq!(desk.services.stats.total_loans(), 3);
    assert_eq!(
        desk.services.stats.top_books(5),
        vec![(DUNE.to_string(), 2), (PETIT_PRINCE.to_string(), 1)]
    );
    assert_eq!(
        desk.services.stats.top_members(1),
        vec![(alice.matricule.clone(), 2)]
    );

    let never: Vec<String> = desk
        .services
        .stats
        .never_borrowed()
        .into_iter()
        .map(|b| b.isbn)
        .collect();
    assert_eq!(never, vec![FOUNDATION.to_string()]);

    let report = desk.services.stats.report();
    assert!(report.contains("TOP 5 BOOKS"));
    assert!(report.contains("Foundation"));
}
